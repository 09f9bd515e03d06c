//! 保険料率表
//!
//! リスク等級ごとの1人あたり基本保険料（元/年）。拒保は0。

use crate::classification::OccupationResult;
use crate::types::RiskCategory;
use serde::{Deserialize, Serialize};

/// 料率表の1行
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateItem {
    pub category: RiskCategory,
    pub price: u32,
    pub label: &'static str,
}

const RATE_TABLE: [(u32, &str); 7] = [
    (0, "拒保/人工核保"),
    (160, "1类 (低风险)"),
    (240, "2类 (低风险)"),
    (380, "3类 (中风险)"),
    (650, "4类 (中高风险)"),
    (1200, "5类 (高风险)"),
    (2000, "6类 (特高风险)"),
];

/// 等級の料率（拒保は人手審査のため0）
pub fn rate_for(category: RiskCategory) -> RateItem {
    let (price, label) = RATE_TABLE[usize::from(category.value())];
    RateItem { category, price, label }
}

/// 全等級の料率（1類から6類、最後に拒保）
pub fn rate_table() -> Vec<RateItem> {
    (1..=RiskCategory::MAX)
        .chain(std::iter::once(0))
        .filter_map(RiskCategory::new)
        .map(rate_for)
        .collect()
}

/// 見積明細
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteItem {
    pub occupation: OccupationResult,
    pub count: u32,
    pub base_premium: u32,
}

impl QuoteItem {
    pub fn new(occupation: OccupationResult, count: u32) -> Self {
        let base_premium = rate_for(occupation.category).price;
        Self {
            occupation,
            count,
            base_premium,
        }
    }

    /// 基本保険料 × 人数（拒保の職業は料率0なので0）
    pub fn subtotal(&self) -> u64 {
        u64::from(self.base_premium) * u64::from(self.count)
    }

    pub fn needs_manual_review(&self) -> bool {
        self.occupation.category.is_rejected()
    }
}

/// 見積合計
pub fn total_premium(items: &[QuoteItem]) -> u64 {
    items.iter().map(QuoteItem::subtotal).sum()
}
