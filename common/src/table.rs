//! 職業分類表モジュール
//!
//! 起動時に一度だけ読み込む不変の参照テーブル。
//! JSON、または保険会社配布のMarkdown表から読み込む。

use crate::error::{Error, Result};
use crate::types::{OccupationDefinition, RiskCategory};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// 職業分類表（行の順序を保持）
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    rows: Vec<OccupationDefinition>,
}

/// データ検証結果
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableReport {
    pub total: usize,
    pub by_category: BTreeMap<u8, usize>,
    pub by_industry: BTreeMap<String, usize>,
    pub by_group: BTreeMap<String, usize>,
    /// 2回目以降に現れた重複コード
    pub duplicate_codes: Vec<String>,
    /// コード・名称・業種のいずれかが空の行（行番号, コード）
    pub incomplete_records: Vec<(usize, String)>,
}

impl TableReport {
    pub fn is_clean(&self) -> bool {
        self.duplicate_codes.is_empty() && self.incomplete_records.is_empty()
    }

    /// 件数の多い順に上位n件
    pub fn top_industries(&self, n: usize) -> Vec<(&str, usize)> {
        top_counts(&self.by_industry, n)
    }

    pub fn top_groups(&self, n: usize) -> Vec<(&str, usize)> {
        top_counts(&self.by_group, n)
    }
}

fn top_counts(counts: &BTreeMap<String, usize>, n: usize) -> Vec<(&str, usize)> {
    let mut sorted: Vec<(&str, usize)> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    // 件数降順、同数は名前順（BTreeMap順を安定ソートで維持）
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    sorted.truncate(n);
    sorted
}

impl ReferenceTable {
    pub fn new(rows: Vec<OccupationDefinition>) -> Self {
        Self { rows }
    }

    /// JSONファイルから読み込み
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// JSON配列から読み込み
    pub fn from_json(json: &str) -> Result<Self> {
        let rows: Vec<OccupationDefinition> = serde_json::from_str(json)?;
        Ok(Self { rows })
    }

    /// Markdown表から読み込み
    ///
    /// 列: 行业名称 | 职业类别 | 代码 | 名称 | 分类
    /// 分類が「拒保」なら0。数値にならない行は読み飛ばす。
    pub fn from_markdown(content: &str) -> Result<Self> {
        let mut rows = Vec::new();
        let mut in_table = false;

        for line in content.lines() {
            let line = line.trim();
            if !line.starts_with('|') {
                continue;
            }

            if line.contains("行业名称") {
                in_table = true;
                continue;
            }
            if !in_table || is_separator_row(line) {
                continue;
            }

            let parts: Vec<&str> = line
                .split('|')
                .map(|p| p.trim())
                .filter(|p| !p.is_empty())
                .collect();
            if parts.len() < 5 {
                continue;
            }

            let Some(category) = parse_category(parts[4]) else {
                continue;
            };

            rows.push(OccupationDefinition {
                industry: parts[0].to_string(),
                group: parts[1].to_string(),
                code: parts[2].to_string(),
                name: parts[3].to_string(),
                category,
            });
        }

        if rows.is_empty() {
            return Err(Error::Parse("职业记录が見つかりません".into()));
        }

        Ok(Self { rows })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.rows)?)
    }

    pub fn rows(&self) -> &[OccupationDefinition] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// コードで検索（先頭一致の行）
    pub fn find_by_code(&self, code: &str) -> Option<&OccupationDefinition> {
        self.rows.iter().find(|row| row.code == code)
    }

    /// 名称・コード・業種・職業類別の部分一致検索（大文字小文字無視）
    pub fn search(&self, keyword: &str) -> Vec<&OccupationDefinition> {
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() {
            return Vec::new();
        }
        self.rows
            .iter()
            .filter(|row| {
                row.name.to_lowercase().contains(&keyword)
                    || row.code.to_lowercase().contains(&keyword)
                    || row.industry.to_lowercase().contains(&keyword)
                    || row.group.to_lowercase().contains(&keyword)
            })
            .collect()
    }

    /// データの完全性を検証
    ///
    /// リクエスト処理では使わない。重複や欠損があっても検索は動作する。
    pub fn verify(&self) -> TableReport {
        let mut report = TableReport {
            total: self.rows.len(),
            ..Default::default()
        };
        let mut seen: HashSet<&str> = HashSet::new();

        for (idx, row) in self.rows.iter().enumerate() {
            if !seen.insert(row.code.as_str()) {
                report.duplicate_codes.push(row.code.clone());
            }

            *report.by_category.entry(row.category.value()).or_insert(0) += 1;
            *report.by_industry.entry(row.industry.clone()).or_insert(0) += 1;
            *report.by_group.entry(row.group.clone()).or_insert(0) += 1;

            if row.code.trim().is_empty() || row.name.trim().is_empty() || row.industry.trim().is_empty() {
                report.incomplete_records.push((idx + 1, row.code.clone()));
            }
        }

        report
    }
}

fn is_separator_row(line: &str) -> bool {
    line.contains('-') && line.chars().all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

fn parse_category(cell: &str) -> Option<RiskCategory> {
    if cell.contains("拒保") {
        return Some(RiskCategory::REJECTED);
    }
    cell.trim().parse::<u8>().ok().and_then(RiskCategory::new)
}
