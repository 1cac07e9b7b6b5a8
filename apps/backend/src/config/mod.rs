pub mod match_rules;

pub use match_rules::MatchConfig;
