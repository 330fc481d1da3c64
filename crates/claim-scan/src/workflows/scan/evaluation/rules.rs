use super::super::domain::{Category, FileDescriptor};

pub(crate) const MIN_PHOTO_COUNT: usize = 10;
pub(crate) const MIN_PHOTO_PAGES: u32 = 4;

const PDF_EXTENSION: &str = ".pdf";

const MOISTURE_KEYWORDS: &[&str] = &["moisture", "log"];
const RH_TEMP_KEYWORDS: &[&str] = &["rh", "temp", "temperature"];
const DAY_MARKERS: &[&str] = &["day 1", "day 2", "day 3"];
const PSYCHROMETRIC_KEYWORDS: &[&str] = &["psychrometric", "gpp", "grains per pound"];
const SIGNATURE_KEYWORDS: &[&str] = &[
    "work authorization",
    "authorization",
    "certificate of completion",
    "signature",
    "signed",
];
const EQUIPMENT_KEYWORDS: &[&str] = &["dehumidifier", "air mover", "serial"];
const INVOICE_KEYWORDS: &[&str] = &["invoice", "inv"];

/// Pass predicate evaluated against the classified packet.
pub type Predicate = fn(&PacketEvidence<'_>) -> bool;

/// Subsets of the packet the predicates need.
#[derive(Debug, Default)]
pub struct FileSets<'a> {
    pub images: Vec<&'a FileDescriptor>,
    pub pdfs: Vec<&'a FileDescriptor>,
}

/// Inputs available to every predicate.
#[derive(Debug)]
pub struct PacketEvidence<'a> {
    pub files: &'a [FileDescriptor],
    pub images: Vec<&'a FileDescriptor>,
    pub pdfs: Vec<&'a FileDescriptor>,
    pub max_pdf_pages: u32,
}

impl<'a> PacketEvidence<'a> {
    pub fn new(files: &'a [FileDescriptor], sets: FileSets<'a>, max_pdf_pages: u32) -> Self {
        Self {
            files,
            images: sets.images,
            pdfs: sets.pdfs,
            max_pdf_pages,
        }
    }

    fn any_named(&self, keywords: &[&str]) -> bool {
        self.files.iter().any(|file| contains_any(&file.name, keywords))
    }

    fn count_named(&self, keywords: &[&str]) -> usize {
        self.files
            .iter()
            .filter(|file| contains_any(&file.name, keywords))
            .count()
    }
}

/// Case-insensitive substring match against any keyword. Keywords are expected in lowercase.
pub fn contains_any(name: &str, keywords: &[&str]) -> bool {
    let name = name.to_lowercase();
    keywords.iter().any(|keyword| name.contains(keyword))
}

/// Images are recognised by declared MIME type while PDFs are recognised by file extension.
pub fn classify(files: &[FileDescriptor]) -> FileSets<'_> {
    let images = files
        .iter()
        .filter(|file| is_image_mime(&file.mime))
        .collect();

    let pdfs = files
        .iter()
        .filter(|file| file.name.to_lowercase().ends_with(PDF_EXTENSION))
        .collect();

    FileSets { images, pdfs }
}

fn is_image_mime(declared: &str) -> bool {
    let declared = declared.to_lowercase();
    [mime::IMAGE_JPEG, mime::IMAGE_PNG]
        .iter()
        .any(|image| image.essence_str() == declared)
}

pub(crate) fn predicate_for(category: Category) -> Predicate {
    match category {
        Category::Photos => photos,
        Category::MoistureLogs => moisture_logs,
        Category::RhTemp => rh_temp,
        Category::Psychrometrics => psychrometrics,
        Category::Signatures => signatures,
        Category::Equipment => equipment,
        Category::Invoice => invoice,
    }
}

fn photos(evidence: &PacketEvidence<'_>) -> bool {
    evidence.images.len() >= MIN_PHOTO_COUNT || evidence.max_pdf_pages >= MIN_PHOTO_PAGES
}

fn moisture_logs(evidence: &PacketEvidence<'_>) -> bool {
    evidence.any_named(MOISTURE_KEYWORDS)
}

// Day markers may come from any file, not only the one that matched the RH/temp keyword.
fn rh_temp(evidence: &PacketEvidence<'_>) -> bool {
    evidence.any_named(RH_TEMP_KEYWORDS)
        && DAY_MARKERS
            .iter()
            .all(|marker| evidence.any_named(std::slice::from_ref(marker)))
}

fn psychrometrics(evidence: &PacketEvidence<'_>) -> bool {
    evidence.any_named(PSYCHROMETRIC_KEYWORDS)
}

fn signatures(evidence: &PacketEvidence<'_>) -> bool {
    evidence.any_named(SIGNATURE_KEYWORDS)
}

fn equipment(evidence: &PacketEvidence<'_>) -> bool {
    evidence.any_named(EQUIPMENT_KEYWORDS)
}

fn invoice(evidence: &PacketEvidence<'_>) -> bool {
    evidence.count_named(INVOICE_KEYWORDS) == 1
}
