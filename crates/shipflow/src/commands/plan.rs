use colored::Colorize;
use shipflow_config::RunConfig;
use shipflow_core::BatchPlan;

/// 解決済みのビルド順を表示する（Docker には接続しない）
pub fn handle(config: &RunConfig) -> anyhow::Result<()> {
    let plan = super::resolve_plan(config)?;
    print_plan(&plan, config);
    Ok(())
}

fn print_plan(plan: &BatchPlan, config: &RunConfig) {
    println!(
        "{} Build plan: {} unit(s) | registry={}",
        "[shipflow]".blue(),
        plan.len(),
        config.default_registry
    );

    for (position, &id) in plan.order().iter().enumerate() {
        let unit = plan.unit(id);
        let name = if unit.image_name().is_empty() {
            unit.path.display().to_string()
        } else {
            unit.image_name().to_string()
        };
        let marker = if plan.is_added(id) {
            " (dependency)".dimmed().to_string()
        } else {
            String::new()
        };

        println!(
            "  {:>3}. {:<12} {:<24} {}{}",
            position + 1,
            unit.registry,
            name.bold(),
            unit.declared_tag(&config.build_version).cyan(),
            marker
        );
    }

    for base in plan.unresolved() {
        println!(
            "  {} no Dockerfile produces local-only base {}",
            "!".yellow().bold(),
            base
        );
    }
}
