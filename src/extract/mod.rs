pub mod gallery;
pub mod proportions;

/// Where a candidate's flag image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// Raw `src` of a thumbnail embedded in the source cell.
    Embedded(String),
    /// No image in the cell; the locator must search by label.
    Lookup,
}

/// One `(label, image)` pair pulled out of a source page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub label: String,
    pub image: ImageRef,
}
