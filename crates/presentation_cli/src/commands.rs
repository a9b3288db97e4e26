//! Command dispatch: wires adapters into services and prints their reports

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use application::{
    BinlogMonitor, CorruptionService, DatabasePort, FaultEnvironment, InterruptSignal,
    LoadGenerator, NetworkFaultController, ReplicationScenarioService, SchemaChurnService,
};
use domain::{CorruptionStrategy, TruncatePercentage};
use infrastructure::{
    FsBinlogStore, LinuxTrafficControl, MysqlCliAdapter, MysqldProcessAdapter, ToolkitConfig,
};
use tracing::info;

use crate::cli::{
    Commands, CorruptArgs, CorruptStrategy, NetworkCommand, ReplicateCommand, RestoreArgs,
    TransactionCommand,
};
use crate::output::{self, Output};

/// Configured toolkit ready to run one command
#[derive(Debug)]
pub struct App {
    config: ToolkitConfig,
    database: Arc<MysqlCliAdapter>,
    seed: Option<u64>,
    output: Output,
}

impl App {
    pub fn new(config: ToolkitConfig, seed: Option<u64>, output: Output) -> Self {
        let database = Arc::new(MysqlCliAdapter::new(config.mysql.clone()));
        Self {
            config,
            database,
            seed,
            output,
        }
    }

    fn database(&self) -> Arc<dyn DatabasePort> {
        self.database.clone()
    }

    fn users_table(&self, table: Option<String>) -> String {
        table.unwrap_or_else(|| self.config.load.users_table.clone())
    }

    pub async fn run(&self, command: Commands, signal: &InterruptSignal) -> Result<()> {
        match command {
            Commands::Corrupt(args) => self.corrupt(args).await,
            Commands::Restore(args) => self.restore(args).await,
            Commands::Network(command) => self.network(command, signal).await,
            Commands::Transaction(command) => self.transaction(command, signal).await,
            Commands::Generate {
                count,
                table,
                interval,
            } => {
                let table = self.users_table(table);
                let report = self
                    .load_generator()
                    .generate_data(count, &table, Duration::from_secs(interval), signal)
                    .await?;
                self.output.report(&report, output::generated)
            },
            Commands::Schema {
                change,
                table,
                count,
            } => {
                let table = self.users_table(table);
                let mut service = SchemaChurnService::new(self.database());
                if let Some(seed) = self.seed {
                    service = service.with_seed(seed);
                }
                let outcomes = service.apply(change, &table, count).await?;
                self.output.report(outcomes.as_slice(), output::schema)
            },
            Commands::Replicate(command) => self.replicate(command, signal).await,
            Commands::Monitor { interval, once } => self.monitor(interval, once, signal).await,
        }
    }

    fn corruption(&self) -> CorruptionService {
        let service = CorruptionService::new(
            Arc::new(FsBinlogStore::new()),
            self.database(),
            self.config.corruption(),
        );
        match self.seed {
            Some(seed) => service.with_seed(seed),
            None => service,
        }
    }

    async fn corrupt(&self, args: CorruptArgs) -> Result<()> {
        let strategy = match args.strategy {
            CorruptStrategy::Truncate { percentage } => CorruptionStrategy::Truncate {
                percentage: TruncatePercentage::new(percentage)?,
            },
            CorruptStrategy::RandomBytes { count } => CorruptionStrategy::RandomBytes { count },
            CorruptStrategy::Magic => CorruptionStrategy::MagicNumber,
        };

        let service = self.corruption();
        let target = service
            .resolve_target(args.file.as_deref())
            .await
            .context("cannot find the binlog to corrupt")?;
        let report = service.corrupt(&target, strategy, !args.no_backup).await?;
        self.output.report(&report, output::corruption)
    }

    async fn restore(&self, args: RestoreArgs) -> Result<()> {
        let service = self.corruption();

        if args.list {
            let backups = service.list_backups().await?;
            return self.output.report(backups.as_slice(), output::backups);
        }

        let restored = if args.all {
            service.restore_all().await?
        } else if let Some(query) = args.backup {
            let backup = service.find_backup(&query).await?;
            let restored = match args.target {
                Some(target) => service.restore(&backup, &target).await?,
                None => service.restore_to_origin(&backup).await?,
            };
            vec![restored]
        } else {
            bail!("nothing to restore: name a backup, or pass --all or --list");
        };

        if args.flush {
            service.flush_after_restore().await?;
        }
        self.output.report(restored.as_slice(), output::restored)
    }

    async fn network(&self, command: NetworkCommand, signal: &InterruptSignal) -> Result<()> {
        let env = FaultEnvironment::new(
            Arc::new(MysqldProcessAdapter::new(self.config.mysql.clone())),
            Arc::new(LinuxTrafficControl::new()),
        );
        let controller = NetworkFaultController::new(self.config.network_faults());
        let defaults = controller.config().clone();

        match command {
            NetworkCommand::Down { kind } => {
                let report = controller.bring_down(&env, kind).await?;
                self.output.report(&report, output::down)
            },
            NetworkCommand::Restore { kind } => {
                let report = controller.restore(&env, kind).await?;
                self.output.report(&report, output::restore)
            },
            NetworkCommand::Up => {
                let report = controller.bring_up(&env).await?;
                self.output.report(&report, output::restore)
            },
            NetworkCommand::Timed { kind, duration } => {
                info!(%kind, duration, "Holding fault");
                let report = controller
                    .run_timed_fault(&env, kind, Duration::from_secs(duration), signal)
                    .await?;
                self.output.report(&report, output::timed)
            },
            NetworkCommand::Flap {
                kind,
                interval,
                duration,
            } => {
                let interval = interval.map_or(defaults.flap_interval, Duration::from_secs);
                let total = duration.map_or(defaults.flap_duration, Duration::from_secs);
                let report = controller
                    .run_flap_cycle(&env, kind, interval, total, signal)
                    .await?;
                self.output.report(&report, output::flap)
            },
            NetworkCommand::Latency { ms } => {
                let window = controller
                    .add_latency(&env, ms.unwrap_or(defaults.default_latency_ms))
                    .await?;
                self.output.report(&window, output::window_opened)
            },
            NetworkCommand::ClearLatency => {
                let report = controller.remove_latency(&env).await?;
                self.output.report(&report, output::restore)
            },
            NetworkCommand::Status => {
                let status = controller.status(&env).await?;
                self.output.report(&status, output::network_status)
            },
        }
    }

    fn load_generator(&self) -> LoadGenerator {
        let generator = LoadGenerator::new(self.database(), self.config.load_generation());
        match self.seed {
            Some(seed) => generator.with_seed(seed),
            None => generator,
        }
    }

    async fn transaction(&self, command: TransactionCommand, signal: &InterruptSignal) -> Result<()> {
        let generator = self.load_generator();
        let report = match command {
            TransactionCommand::Bulk { rows, batch_size } => {
                let batch_size = batch_size.unwrap_or(generator.config().batch_size);
                generator.bulk_insert(rows, batch_size, signal).await?
            },
            TransactionCommand::Large {
                rows,
                size_kb,
                kind,
            } => {
                generator
                    .large_payload_insert(rows, size_kb, kind, signal)
                    .await?
            },
            TransactionCommand::Hold { duration, ops } => {
                generator
                    .hold_open_transaction(Duration::from_secs(duration), ops, signal)
                    .await?
            },
            TransactionCommand::Mixed {
                rows,
                size_kb,
                duration,
            } => {
                generator
                    .mixed_load(rows, size_kb, Duration::from_secs(duration), signal)
                    .await?
            },
        };
        self.output.report(&report, output::load)
    }

    async fn replicate(&self, command: ReplicateCommand, signal: &InterruptSignal) -> Result<()> {
        let mut service = ReplicationScenarioService::new(
            self.database(),
            self.config.load.users_table.clone(),
            self.config.load.meta_table.clone(),
        );
        if let Some(seed) = self.seed {
            service = service.with_seed(seed);
        }

        match command {
            ReplicateCommand::Lag {
                duration,
                min_delay_ms,
                max_delay_ms,
            } => {
                let report = service
                    .lag(
                        Duration::from_secs(duration),
                        Duration::from_millis(min_delay_ms),
                        Duration::from_millis(max_delay_ms),
                        signal,
                    )
                    .await?;
                self.output.report(&report, output::lag)
            },
            ReplicateCommand::Disconnect => {
                let report = service.disconnect().await?;
                self.output.report(&report, output::scenario)
            },
            ReplicateCommand::GtidGap => {
                let report = service.gtid_gap().await?;
                self.output.report(&report, output::scenario)
            },
        }
    }

    async fn monitor(&self, interval: u64, once: bool, signal: &InterruptSignal) -> Result<()> {
        let monitor = BinlogMonitor::new(self.database(), self.config.load.users_table.clone());

        if once {
            let snapshot = monitor.snapshot().await?;
            return self.output.report(&snapshot, output::snapshot);
        }

        let json = self.output.is_json();
        let taken = monitor
            .watch(Duration::from_secs(interval.max(1)), signal, move |snapshot| {
                if json {
                    if let Ok(line) = serde_json::to_string(snapshot) {
                        println!("{line}");
                    }
                } else {
                    output::snapshot(snapshot);
                }
            })
            .await?;
        info!(snapshots = taken, "Monitor stopped");
        Ok(())
    }
}
