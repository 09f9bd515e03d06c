//! Occupation AI Common Library
//!
//! CLIとライブラリ利用側で共有される職業分類のコア
//! （分類表・語彙・検索・プロンプト・応答解析・決定）。
//! I/Oと非同期処理は持たない。

pub mod types;
pub mod error;
pub mod table;
pub mod lexicon;
pub mod keywords;
pub mod expander;
pub mod similarity;
pub mod retrieval;
pub mod prompts;
pub mod parser;
pub mod decision;
pub mod classification;
pub mod rates;

pub use types::{
    AlternativeMatch, DecisionResult, DecisionSource, MatchResult, MatchType, OccupationDefinition,
    QueryAnalysis, RetrievalResult, RiskCategory,
};
pub use error::{Error, Result};
pub use table::{ReferenceTable, TableReport};
pub use lexicon::Lexicon;
pub use retrieval::{MatcherPass, RetrievalConfig, Retriever};
pub use prompts::build_decision_prompt;
pub use parser::{extract_json_object, parse_decision_response};
pub use decision::{complete_decision, decide_with, decision_prompt, fallback_decision, short_circuit};
pub use classification::{build_results, local_results, ClassificationResponse, OccupationResult};
pub use rates::{rate_for, total_premium, QuoteItem};
