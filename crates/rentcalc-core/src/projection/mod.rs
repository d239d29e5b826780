pub mod depreciation;
pub mod engine;
pub mod inputs;
pub mod loans;
pub mod metrics;
pub mod tax;

pub use engine::{project, project_with_config};
pub use inputs::{DepreciationMethod, InvestmentInputs, SecondaryFacility, SecondaryLoan, SecondaryLoanType};
pub use metrics::{Dscr, MetricsResult, TimelineYear};
