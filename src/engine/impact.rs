// ==========================================
// 团队产能规划 - 方案影响聚合引擎
// ==========================================
// 职责: 基于可编辑方案与产能快照计算成员负载/利用率预测
// 红线: 纯同步计算，不修改快照，不做 I/O
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::PlannerConfig;
use crate::domain::member::{balance_score, utilization_pct, CapacitySnapshot};
use crate::domain::plan::{ImpactPreview, RebalancePlan};
use crate::domain::types::LoadBand;

// ==========================================
// MemberImpact - 成员影响行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberImpact {
    pub member_id: String,
    pub member_name: String,
    pub effective_capacity: f64,
    pub current_workload: f64,
    pub points_out: f64,             // 作为 from 移出的点数
    pub points_in: f64,              // 作为 to 移入的点数
    pub projected_workload: f64,
    pub current_utilization: f64,
    pub projected_utilization: f64,
    pub band_before: LoadBand,
    pub band_after: LoadBand,
}

impl MemberImpact {
    pub fn delta(&self) -> f64 {
        self.projected_workload - self.current_workload
    }

    pub fn before_label(&self) -> String {
        format_load(self.current_workload, self.effective_capacity, self.current_utilization)
    }

    pub fn after_label(&self) -> String {
        format_load(self.projected_workload, self.effective_capacity, self.projected_utilization)
    }
}

fn format_load(workload: f64, capacity: f64, pct: f64) -> String {
    format!("{}/{} ({:.0}%)", workload, capacity, pct)
}

// ==========================================
// ImpactTable - 影响预览表
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactTable {
    pub rows: Vec<MemberImpact>,     // 按快照中成员顺序
    pub balance_score_before: f64,
    pub balance_score_after: f64,
    // 全队（含未被方案引用的成员）超载/低负载人数
    pub overloaded_before: usize,
    pub overloaded_after: usize,
    pub underutilized_before: usize,
    pub underutilized_after: usize,
}

impl ImpactTable {
    pub fn row(&self, member_id: &str) -> Option<&MemberImpact> {
        self.rows.iter().find(|r| r.member_id == member_id)
    }

    pub fn total_points_moved(&self) -> f64 {
        self.rows.iter().map(|r| r.points_in).sum()
    }
}

// ==========================================
// ImpactEngine - 影响聚合引擎
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactEngine {
    overload_threshold_pct: f64,
    underutilized_threshold_pct: f64,
}

impl Default for ImpactEngine {
    fn default() -> Self {
        Self::from_config(&PlannerConfig::default())
    }
}

impl ImpactEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按规划配置中的阈值分档
    pub fn from_config(config: &PlannerConfig) -> Self {
        Self {
            overload_threshold_pct: config.overload_threshold_pct,
            underutilized_threshold_pct: config.underutilized_threshold_pct,
        }
    }

    fn classify(&self, utilization_pct: f64) -> LoadBand {
        LoadBand::classify(utilization_pct, self.overload_threshold_pct, self.underutilized_threshold_pct)
    }

    /// 聚合方案影响
    ///
    /// projected = current - Σ(from==成员) + Σ(to==成员)
    ///
    /// # 说明
    /// - from == to 的空操作项不计入
    /// - 方案引用但快照中已不存在的成员不出现在结果中
    pub fn aggregate(&self, plan: &RebalancePlan, snapshot: &CapacitySnapshot) -> ImpactTable {
        let mut points_out: HashMap<&str, f64> = HashMap::new();
        let mut points_in: HashMap<&str, f64> = HashMap::new();

        for mv in plan.moves.iter().filter(|m| !m.is_noop()) {
            *points_out.entry(mv.from.member_id.as_str()).or_insert(0.0) += mv.points_moved;
            *points_in.entry(mv.to.member_id.as_str()).or_insert(0.0) += mv.points_moved;
        }

        for mv in &plan.moves {
            for member_id in [&mv.from.member_id, &mv.to.member_id] {
                if !snapshot.contains_member(member_id) {
                    tracing::debug!(member_id = %member_id, work_item_id = %mv.work_item_id, "方案引用的成员不在当前快照中");
                }
            }
        }

        let referenced = |id: &str| {
            plan.moves
                .iter()
                .any(|m| m.from.member_id == id || m.to.member_id == id)
        };

        let mut rows = Vec::new();
        let mut projected_all = Vec::with_capacity(snapshot.members.len());

        for member in &snapshot.members {
            let out = points_out.get(member.member_id.as_str()).copied().unwrap_or(0.0);
            let inn = points_in.get(member.member_id.as_str()).copied().unwrap_or(0.0);
            let projected_workload = member.current_workload - out + inn;
            let projected_utilization = utilization_pct(projected_workload, member.effective_capacity);
            projected_all.push(projected_utilization);

            if !referenced(&member.member_id) {
                continue;
            }

            let current_utilization = member.utilization();
            rows.push(MemberImpact {
                member_id: member.member_id.clone(),
                member_name: member.name.clone(),
                effective_capacity: member.effective_capacity,
                current_workload: member.current_workload,
                points_out: out,
                points_in: inn,
                projected_workload,
                current_utilization,
                projected_utilization,
                band_before: self.classify(current_utilization),
                band_after: self.classify(projected_utilization),
            });
        }

        let count_after = |band: LoadBand| {
            projected_all
                .iter()
                .filter(|pct| self.classify(**pct) == band)
                .count()
        };

        ImpactTable {
            overloaded_before: snapshot.overloaded_members(self.overload_threshold_pct).len(),
            overloaded_after: count_after(LoadBand::Overloaded),
            underutilized_before: snapshot
                .underutilized_members(self.underutilized_threshold_pct)
                .len(),
            underutilized_after: count_after(LoadBand::Underutilized),
            rows,
            balance_score_before: snapshot.balance_score(),
            balance_score_after: balance_score(projected_all),
        }
    }

    /// 用聚合结果回填每个移动项的影响预览，返回新方案
    pub fn refresh_previews(&self, plan: &RebalancePlan, table: &ImpactTable) -> RebalancePlan {
        let mut refreshed = plan.clone();
        for mv in refreshed.moves.iter_mut() {
            let from = table.row(&mv.from.member_id);
            let to = table.row(&mv.to.member_id);
            mv.impact_preview = ImpactPreview {
                from_util_before: from.map(|r| r.current_utilization).unwrap_or(0.0),
                from_util_after: from.map(|r| r.projected_utilization).unwrap_or(0.0),
                to_util_before: to.map(|r| r.current_utilization).unwrap_or(0.0),
                to_util_after: to.map(|r| r.projected_utilization).unwrap_or(0.0),
            };
        }
        refreshed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::member::Member;
    use crate::domain::plan::{MemberRef, Move};
    use chrono::Utc;

    fn member(id: &str, capacity: f64, workload: f64) -> Member {
        Member {
            member_id: id.to_string(),
            name: format!("name-{}", id),
            base_capacity: capacity,
            effective_capacity: capacity,
            current_workload: workload,
            work_items: vec![],
        }
    }

    fn snapshot() -> CapacitySnapshot {
        CapacitySnapshot {
            team_id: "team-1".to_string(),
            sprint_id: None,
            members: vec![
                member("A", 10.0, 15.0),
                member("B", 10.0, 4.0),
                member("C", 10.0, 5.0),
                member("D", 0.0, 0.0),
            ],
            fetched_at: Utc::now(),
        }
    }

    fn mv(item: &str, from: &str, to: &str, points: f64) -> Move {
        Move {
            work_item_id: item.to_string(),
            work_item_title: item.to_string(),
            story_id: None,
            from: MemberRef::new(from, from),
            to: MemberRef::new(to, to),
            points_moved: points,
            impact_preview: ImpactPreview::default(),
        }
    }

    #[test]
    fn test_aggregate_projects_workload() {
        let plan = RebalancePlan::new(vec![mv("T1", "A", "B", 3.0), mv("T2", "A", "C", 2.0)]);
        let table = ImpactEngine::new().aggregate(&plan, &snapshot());

        let a = table.row("A").unwrap();
        assert_eq!(a.projected_workload, 10.0);
        assert_eq!(a.delta(), -5.0);
        assert_eq!(a.projected_utilization, 100.0);
        assert_eq!(table.row("B").unwrap().projected_workload, 7.0);
        assert_eq!(table.row("C").unwrap().projected_workload, 7.0);
        assert!(table.row("D").is_none());
        assert_eq!(table.total_points_moved(), 5.0);
        assert!(table.balance_score_after >= table.balance_score_before);
    }

    #[test]
    fn test_noop_move_has_no_effect() {
        let plan = RebalancePlan::new(vec![mv("T1", "A", "A", 3.0)]);
        let table = ImpactEngine::new().aggregate(&plan, &snapshot());
        let a = table.row("A").unwrap();
        assert_eq!(a.projected_workload, a.current_workload);
        assert_eq!(a.points_out, 0.0);
    }

    #[test]
    fn test_zero_capacity_destination_reports_saturated() {
        let plan = RebalancePlan::new(vec![mv("T1", "A", "D", 3.0)]);
        let table = ImpactEngine::new().aggregate(&plan, &snapshot());
        let d = table.row("D").unwrap();
        assert_eq!(d.current_utilization, 100.0);
        assert_eq!(d.projected_utilization, 100.0);
        assert_eq!(d.after_label(), "3/0 (100%)");
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let plan = RebalancePlan::new(vec![mv("T1", "A", "B", 3.0)]);
        let snap = snapshot();
        let before = snap.clone();
        let engine = ImpactEngine::new();

        let first = engine.aggregate(&plan, &snap);
        let second = engine.aggregate(&plan, &snap);
        assert_eq!(first, second);
        assert_eq!(snap, before);
    }

    #[test]
    fn test_bands_follow_configured_thresholds() {
        let plan = RebalancePlan::new(vec![mv("T1", "A", "B", 3.0), mv("T2", "A", "C", 2.0)]);

        let table = ImpactEngine::new().aggregate(&plan, &snapshot());
        let a = table.row("A").unwrap();
        assert_eq!(a.band_before, LoadBand::Overloaded);
        assert_eq!(a.band_after, LoadBand::Balanced);
        assert_eq!(table.row("B").unwrap().band_before, LoadBand::Underutilized);
        assert_eq!(table.row("B").unwrap().band_after, LoadBand::Balanced);
        // D 容量为 0，利用率记为 100，不超过阈值
        assert_eq!(table.overloaded_before, 1);
        assert_eq!(table.overloaded_after, 0);
        assert_eq!(table.underutilized_before, 2);
        assert_eq!(table.underutilized_after, 0);

        let strict = ImpactEngine::from_config(&PlannerConfig {
            overload_threshold_pct: 90.0,
            underutilized_threshold_pct: 75.0,
            ..PlannerConfig::default()
        });
        let table = strict.aggregate(&plan, &snapshot());
        assert_eq!(table.row("A").unwrap().band_after, LoadBand::Overloaded);
        assert_eq!(table.row("C").unwrap().band_after, LoadBand::Underutilized);
        assert_eq!(table.overloaded_after, 2);
        assert_eq!(table.underutilized_after, 2);
    }

    #[test]
    fn test_refresh_previews() {
        let plan = RebalancePlan::new(vec![mv("T1", "A", "B", 3.0)]);
        let engine = ImpactEngine::new();
        let table = engine.aggregate(&plan, &snapshot());
        let refreshed = engine.refresh_previews(&plan, &table);

        let preview = refreshed.moves[0].impact_preview;
        assert_eq!(preview.from_util_before, 150.0);
        assert_eq!(preview.from_util_after, 120.0);
        assert_eq!(preview.to_util_before, 40.0);
        assert_eq!(preview.to_util_after, 70.0);
        assert_eq!(plan.moves[0].impact_preview, ImpactPreview::default());
    }
}
