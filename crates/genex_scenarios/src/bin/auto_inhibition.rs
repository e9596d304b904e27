use genex_core::scenario::ScenarioKind;

fn main() -> anyhow::Result<()> {
    genex_scenarios::run_and_report(ScenarioKind::AutoInhibition)
}
