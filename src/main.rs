use cabinet_configurator::{ConfiguratorConfig, configurator};

fn main() -> anyhow::Result<()> {
    configurator::run(ConfiguratorConfig::default())
}
