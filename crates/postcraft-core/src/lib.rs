pub mod draft;
pub mod hangul;
pub mod keywords;
pub mod profile;
pub mod request;
pub mod text;

pub use draft::GeneratedDraft;
pub use hangul::Particle;
pub use keywords::{ChecklistKeyword, KeywordFamily};
pub use profile::{UsageCounters, WriterProfile, WriterStatus};
pub use request::{Background, GenerationRequest, RequestError};
