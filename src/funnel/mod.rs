//! 渐进式画像漏斗
//!
//! 四阶段向导（身份 → 联系方式 → 预算/城市 → 需求），每阶段
//! 转换时投递部分画像，放弃时已投递数据即为留存（drop-off 部分捕获）

pub mod draft;
pub mod machine;
pub mod stages;

pub use draft::{BuyerStatus, LeadDraft, StageInput};
pub use machine::{
    AdvanceOutcome, FunnelDeps, FunnelManager, ProfileWizard, SingleShotForm, SubmitOutcome,
};
pub use stages::ProfileStage;
