//! 渐进式画像阶段
//!
//! 四个阶段按固定顺序推进：身份 → 联系方式 → 预算/城市 → 需求。
//! 阶段号以整数 1-4 出现在 CRM 载荷与前端协议中。

use serde_repr::{Deserialize_repr, Serialize_repr};

/// 画像阶段（线上序号 1-4）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum ProfileStage {
    Identity = 1,
    Contact = 2,
    BudgetLocation = 3,
    Requirements = 4,
}

impl ProfileStage {
    /// 所有阶段的顺序
    pub const ALL: [Self; 4] = [
        Self::Identity,
        Self::Contact,
        Self::BudgetLocation,
        Self::Requirements,
    ];

    /// 阶段序号（1-4）
    pub fn number(&self) -> u8 {
        *self as u8
    }

    /// 下一阶段；最后一个阶段返回 None（进入 Complete）
    pub fn next(&self) -> Option<Self> {
        let idx = Self::ALL.iter().position(|x| x == self)?;
        Self::ALL.get(idx + 1).copied()
    }

    /// 上一阶段；第一个阶段返回 None
    pub fn prev(&self) -> Option<Self> {
        let idx = Self::ALL.iter().position(|x| x == self)?;
        idx.checked_sub(1).map(|i| Self::ALL[i])
    }

    /// 阶段显示标题
    pub fn display_title(&self) -> &'static str {
        match self {
            Self::Identity => "About You",
            Self::Contact => "Contact Details",
            Self::BudgetLocation => "Budget & Location",
            Self::Requirements => "Your Requirements",
        }
    }
}
