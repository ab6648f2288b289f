use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use beltline_control::ControlLoop;
use beltline_engine::AggregateHub;
use beltline_events::{EventLog, MemoryEventLog};
use beltline_factory::controllers::{
    CoinController, ForkliftController, MachineController, RobotController,
};
use beltline_factory::{CoinFace, Dashboard, FactoryConfig, MachineBuffer, RobotStation};

#[derive(Parser)]
#[command(name = "beltline", about = "Factory line and coin-toss demo programs")]
struct Cli {
    /// Which program to run.
    #[arg(value_enum)]
    program: Program,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Program {
    /// Producer loop: keep the machine buffer fed.
    Machine,
    /// Transfer loop: pick up from the machine, package.
    Robot,
    /// Drain loop: haul packaged parts away.
    Forklift,
    /// Read-only console dashboard.
    Dashboard,
    /// The coin-toss toy.
    Cointoss,
    /// All three station loops plus the dashboard in one process.
    Factory,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if FactoryConfig::debug_enabled() {
        "debug"
    } else {
        "info"
    };
    let mut filter = EnvFilter::from_default_env();
    for target in [
        "beltline_events",
        "beltline_engine",
        "beltline_control",
        "beltline_factory",
    ] {
        filter = filter.add_directive(format!("{target}={level}").parse()?);
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = FactoryConfig::from_env();

    // The in-memory log stands in for the external event store. It is
    // process-local, so the single-loop programs run their station in
    // isolation; `factory` closes the loop end to end.
    let log: Arc<dyn EventLog> = Arc::new(MemoryEventLog::new());
    let hub = AggregateHub::new(log.clone());

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutting down");
                shutdown.cancel();
            }
        });
    }

    info!(program = ?cli.program, "beltline starting");

    match cli.program {
        Program::Machine => run_machine(&hub, log, &config, shutdown).await,
        Program::Robot => run_robot(&hub, log, &config, shutdown).await,
        Program::Forklift => run_forklift(&hub, log, &config, shutdown).await,
        Program::Cointoss => run_cointoss(&hub, log, &config, shutdown).await,
        Program::Dashboard => {
            let dashboard = Dashboard::start(&hub, &config).await?;
            shutdown.cancelled().await;
            dashboard.stop().await?;
            Ok(())
        }
        Program::Factory => {
            let dashboard = Dashboard::start(&hub, &config).await?;
            tokio::try_join!(
                run_machine(&hub, log.clone(), &config, shutdown.clone()),
                run_robot(&hub, log.clone(), &config, shutdown.clone()),
                run_forklift(&hub, log.clone(), &config, shutdown.clone()),
            )?;
            dashboard.stop().await?;
            Ok(())
        }
    }
}

async fn run_machine(
    hub: &AggregateHub,
    log: Arc<dyn EventLog>,
    config: &FactoryConfig,
    shutdown: CancellationToken,
) -> Result<()> {
    let (machine, obs) = hub
        .watch(MachineBuffer {
            capacity: config.machine_capacity,
        })
        .await?;
    let controller = MachineController::new(machine, config);
    ControlLoop::new("machine", controller, log)
        .run(shutdown)
        .await?;
    obs.stop().await?;
    Ok(())
}

async fn run_robot(
    hub: &AggregateHub,
    log: Arc<dyn EventLog>,
    config: &FactoryConfig,
    shutdown: CancellationToken,
) -> Result<()> {
    let (machine, machine_obs) = hub
        .watch(MachineBuffer {
            capacity: config.machine_capacity,
        })
        .await?;
    let (robot, robot_obs) = hub
        .watch(RobotStation {
            input_capacity: config.robot_input_capacity,
            output_capacity: config.robot_output_capacity,
        })
        .await?;
    let controller = RobotController::new(machine, robot, config);
    ControlLoop::new("robot", controller, log)
        .run(shutdown)
        .await?;
    machine_obs.stop().await?;
    robot_obs.stop().await?;
    Ok(())
}

async fn run_forklift(
    hub: &AggregateHub,
    log: Arc<dyn EventLog>,
    config: &FactoryConfig,
    shutdown: CancellationToken,
) -> Result<()> {
    let (robot, obs) = hub
        .watch(RobotStation {
            input_capacity: config.robot_input_capacity,
            output_capacity: config.robot_output_capacity,
        })
        .await?;
    let controller = ForkliftController::new(robot, config);
    ControlLoop::new("forklift", controller, log)
        .run(shutdown)
        .await?;
    obs.stop().await?;
    Ok(())
}

async fn run_cointoss(
    hub: &AggregateHub,
    log: Arc<dyn EventLog>,
    config: &FactoryConfig,
    shutdown: CancellationToken,
) -> Result<()> {
    // Print each toss as it lands.
    let sink = hub
        .observe(CoinFace, |snap| {
            info!(heads = snap.value.heads, as_of = snap.as_of_seq, "coin toss");
        })
        .await?;

    let (coin, obs) = hub.watch(CoinFace).await?;
    let controller = CoinController::new(coin, config);
    ControlLoop::new("cointoss", controller, log)
        .run(shutdown)
        .await?;

    obs.stop().await?;
    sink.stop().await?;
    Ok(())
}
