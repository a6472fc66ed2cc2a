//! Pipeline summary
//!
//! Aggregates over a list of deals for the status overview: how many deals
//! are done, progressing or stuck, how they split by priority, and what the
//! forecast adds up to.

use serde::Serialize;

use crate::models::{Deal, DealStatus, Priority};

/// Deal count per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub done: usize,
    pub progress: usize,
    pub stuck: usize,
}

impl StatusCounts {
    pub fn get(&self, status: DealStatus) -> usize {
        match status {
            DealStatus::Done => self.done,
            DealStatus::Progress => self.progress,
            DealStatus::Stuck => self.stuck,
        }
    }

    fn bump(&mut self, status: DealStatus) {
        match status {
            DealStatus::Done => self.done += 1,
            DealStatus::Progress => self.progress += 1,
            DealStatus::Stuck => self.stuck += 1,
        }
    }
}

/// Deal count per priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl PriorityCounts {
    pub fn get(&self, priority: Priority) -> usize {
        match priority {
            Priority::Low => self.low,
            Priority::Medium => self.medium,
            Priority::High => self.high,
        }
    }

    fn bump(&mut self, priority: Priority) {
        match priority {
            Priority::Low => self.low += 1,
            Priority::Medium => self.medium += 1,
            Priority::High => self.high += 1,
        }
    }
}

/// Totals over a set of deals, optionally limited to one quarter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealSummary {
    /// Quarter the summary was limited to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quarter: Option<String>,
    pub total: usize,
    pub by_status: StatusCounts,
    pub by_priority: PriorityCounts,
    /// Sum of every present forecast amount
    pub forecast_total: i64,
}

impl DealSummary {
    pub fn from_deals(deals: &[Deal], quarter: Option<&str>) -> Self {
        let mut summary = DealSummary {
            quarter: quarter.map(str::to_string),
            ..Default::default()
        };

        for deal in deals
            .iter()
            .filter(|d| quarter.map_or(true, |q| d.quarter == q))
        {
            summary.total += 1;
            summary.by_status.bump(deal.status);
            summary.by_priority.bump(deal.priority);
            summary.forecast_total = summary
                .forecast_total
                .saturating_add(deal.forecast_amount.unwrap_or(0));
        }

        summary
    }

    /// Share of deals that are done, as a percentage
    pub fn done_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.by_status.done as f64 * 100.0 / self.total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewDeal;
    use chrono::Utc;

    fn deal(
        id: u64,
        quarter: &str,
        status: DealStatus,
        priority: Priority,
        forecast: Option<i64>,
    ) -> Deal {
        Deal::new(
            id,
            NewDeal {
                account_name: "Acme".to_string(),
                deal_name: format!("Deal {}", id),
                quarter: quarter.to_string(),
                status,
                priority,
                area: "Hà Nội".to_string(),
                vendor_id: None,
                forecast_amount: forecast,
            },
            id as i64,
            Utc::now(),
        )
    }

    fn sample() -> Vec<Deal> {
        vec![
            deal(1, "Q1/2024", DealStatus::Done, Priority::High, Some(500)),
            deal(2, "Q1/2024", DealStatus::Stuck, Priority::Low, None),
            deal(3, "Q2/2024", DealStatus::Progress, Priority::High, Some(250)),
            deal(4, "Q1/2024", DealStatus::Done, Priority::Medium, Some(100)),
        ]
    }

    #[test]
    fn test_summary_all_quarters() {
        let summary = DealSummary::from_deals(&sample(), None);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.by_status.get(DealStatus::Done), 2);
        assert_eq!(summary.by_status.get(DealStatus::Progress), 1);
        assert_eq!(summary.by_priority.get(Priority::High), 2);
        assert_eq!(summary.forecast_total, 850);
        assert_eq!(summary.done_percent(), 50.0);
    }

    #[test]
    fn test_summary_one_quarter() {
        let summary = DealSummary::from_deals(&sample(), Some("Q1/2024"));
        assert_eq!(summary.quarter.as_deref(), Some("Q1/2024"));
        assert_eq!(summary.total, 3);
        assert_eq!(summary.by_status.stuck, 1);
        assert_eq!(summary.by_status.progress, 0);
        assert_eq!(summary.forecast_total, 600);
    }

    #[test]
    fn test_empty_summary() {
        let summary = DealSummary::from_deals(&[], Some("Q4/2025"));
        assert_eq!(summary.total, 0);
        assert_eq!(summary.done_percent(), 0.0);
    }
}
