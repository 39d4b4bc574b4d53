pub mod client;
pub mod content;
pub mod gallery;
pub mod invoice;
pub mod lead;
pub mod questionnaire;
pub mod session;
