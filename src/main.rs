// ==========================================
// 团队产能规划 - 控制台入口
// ==========================================
// 用法:
//   capacity-planner show <team_id> [sprint_id]
//   capacity-planner apply <team_id> [sprint_id] [index=member_id ...]
//   capacity-planner reassign <team_id> <work_item_id> <member_id>
//   capacity-planner history <team_id> [page]
//
// 环境变量: CAPACITY_API_URL / CAPACITY_API_KEY / CAPACITY_PLANNER_DB_PATH / RUST_LOG
// ==========================================

use std::error::Error;

use capacity_planner::app::{get_default_db_path, AppState};
use capacity_planner::config::ServiceConfig;
use capacity_planner::{ImpactTable, ReassignOutcome, RebalancePlan, TeamPlanningSession};

const USAGE: &str = "usage: capacity-planner <show|apply|reassign|history> <team_id> [args...]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    capacity_planner::logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (command, team_id) = match (args.first(), args.get(1)) {
        (Some(c), Some(t)) => (c.as_str(), t.as_str()),
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };
    let rest = &args[2..];

    tracing::info!("{} v{}", capacity_planner::APP_NAME, capacity_planner::VERSION);

    let state = AppState::new(get_default_db_path(), &ServiceConfig::from_env())?;
    let session = state.planning_api.session(team_id)?;

    match command {
        "show" => {
            session.load_analysis(rest.first().map(String::as_str)).await?;
            print_session(&session)?;
        }
        "apply" => {
            session.load_analysis(rest.first().map(String::as_str)).await?;
            for edit in rest.iter().skip(1) {
                let (index, member_id) = edit
                    .split_once('=')
                    .ok_or_else(|| format!("无效的编辑参数: {}", edit))?;
                session.set_destination(index.trim().parse()?, member_id.trim())?;
            }
            print_session(&session)?;

            let report = session.apply().await?;
            println!("{}", report.summary);
            println!("entry_id={}", report.entry.entry_id);
        }
        "reassign" => {
            let (work_item_id, member_id) = match (rest.first(), rest.get(1)) {
                (Some(w), Some(m)) => (w, m),
                _ => return Err(USAGE.into()),
            };
            session.refresh_snapshot().await?;
            match session.reassign(work_item_id, member_id).await? {
                ReassignOutcome::Reassigned(r) => {
                    println!("{} -> {}", r.work_item.work_item_id, r.work_item.owner_id)
                }
                ReassignOutcome::NoOp => println!("no change"),
            }
        }
        "history" => {
            let page = rest.first().map(|p| p.parse::<u32>()).transpose()?.unwrap_or(0);
            let ledger = session.local_history(page)?;
            for entry in &ledger.entries {
                println!("{}  {}  {}", entry.applied_at.to_rfc3339(), entry.entry_id, entry.summary_text());
            }
            if ledger.has_more() {
                println!("... 更多记录请查看第 {} 页", ledger.page + 1);
            }
        }
        other => return Err(format!("未知命令: {}\n{}", other, USAGE).into()),
    }

    Ok(())
}

fn print_session(session: &TeamPlanningSession) -> Result<(), Box<dyn Error>> {
    let view = session.view()?;
    println!("phase={:?} manual_override={}", view.phase, view.manual_override);
    if let Some(warning) = &view.override_warning {
        println!("! {}", warning);
    }
    print_plan(&view.plan);
    if let Some(impact) = &view.impact {
        print_impact(impact);
    }
    Ok(())
}

fn print_plan(plan: &RebalancePlan) {
    for (index, mv) in plan.moves.iter().enumerate() {
        println!(
            "[{}] {} ({:.1}) {} -> {}{}",
            index,
            mv.work_item_title,
            mv.points_moved,
            mv.from.member_name,
            mv.to.member_name,
            if mv.is_noop() { "  (no-op)" } else { "" }
        );
    }
}

fn print_impact(impact: &ImpactTable) {
    for row in &impact.rows {
        println!(
            "{:<20} {} -> {}  [{} -> {}]",
            row.member_name,
            row.before_label(),
            row.after_label(),
            row.band_before.as_str(),
            row.band_after.as_str()
        );
    }
    println!(
        "balance {:.2} -> {:.2}, overloaded {} -> {}, underutilized {} -> {}",
        impact.balance_score_before,
        impact.balance_score_after,
        impact.overloaded_before,
        impact.overloaded_after,
        impact.underutilized_before,
        impact.underutilized_after
    );
}
