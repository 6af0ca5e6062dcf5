pub mod service;
pub mod types;

pub use service::BeneficiaryService;
pub use types::{
    Beneficiary, BeneficiaryDetail, BeneficiaryDraft, BeneficiaryFilter, BeneficiaryListItem, BeneficiaryStats,
    BeneficiaryStatus, Category, Sex, SupportType,
};
