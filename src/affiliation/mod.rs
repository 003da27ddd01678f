//! Affiliation analysis: normalization, academic/company classification and
//! email extraction.
//!
//! - [`normalize`]: case-folded, accent-free, whitespace-collapsed text for matching
//! - [`AffiliationClassifier`]: ordered rule chain, academic terms before company terms
//! - [`extract_email`]: first email address in a free-text block
//!
//! # Example
//!
//! ```rust
//! use pubmed_affiliations::affiliation::{extract_email, AffiliationClassifier};
//!
//! let classifier = AffiliationClassifier::default();
//! let text = "Acme Biotech, Cambridge, MA. jdoe@acmebiotech.com";
//!
//! let result = classifier.classify(text);
//! assert!(result.is_non_academic);
//! assert_eq!(extract_email(text).as_deref(), Some("jdoe@acmebiotech.com"));
//! ```

mod classifier;
mod email;
mod normalize;

pub use classifier::{
    AffiliationClassifier, ClassificationResult, Outcome, Rule, TermMatch, ACADEMIC_DEFAULT,
};
pub use email::{extract_email, extract_emails};
pub use normalize::{normalize, tokens};
