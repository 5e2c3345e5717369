//! statement-extract: the extraction seam, its model-backed and rule-based
//! implementations, and the batch orchestrator that drives them.

pub mod extractor;
pub mod llm;
pub mod orchestrator;
pub mod rules;

pub use extractor::{parse_response, validate_records, ExtractError, ExtractionRequest, Extractor};
pub use llm::{LlmExtractor, LlmSettings, Provider};
pub use orchestrator::{BatchFailure, Orchestrator, RunOutcome, RunReport};
pub use rules::{clean_supplier, match_project, RuleExtractor};
