//! Signal Adapters

pub mod gammawizard;

pub use gammawizard::{GammaWizardConfig, GammaWizardSignal, extract_trade, parse_trade};
