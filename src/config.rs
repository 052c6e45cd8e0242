//! Environment configuration.
//!
//! Every setting has a default; invalid values are logged and replaced by the
//! default instead of aborting startup.

use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use log::warn;

use crate::optimizer::{PackingConfig, StrategyKind};

/// Complete application configuration.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub optimizer: OptimizerConfig,
}

impl AppConfig {
    /// Reads the process environment (after `.env` has been loaded).
    pub fn from_env() -> Self {
        Self::from_lookup(env_string)
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            api: ApiConfig::from_lookup(&lookup),
            optimizer: OptimizerConfig::from_lookup(&lookup),
        }
    }
}

/// HTTP listener settings.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const HOST_VAR: &'static str = "LOAD_PLANNER_API_HOST";
    const PORT_VAR: &'static str = "LOAD_PLANNER_API_PORT";
    const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
    const DEFAULT_PORT: u16 = 8080;

    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        let (bind_ip, display_host) = match lookup(Self::HOST_VAR) {
            Some(raw) => match raw.parse::<IpAddr>() {
                Ok(ip) => (ip, raw),
                Err(err) => {
                    warn!(
                        "Could not parse {} ('{}'): {}. Using {}.",
                        Self::HOST_VAR,
                        raw,
                        err,
                        Self::DEFAULT_HOST
                    );
                    (Self::DEFAULT_HOST, Self::DEFAULT_HOST.to_string())
                }
            },
            None => (Self::DEFAULT_HOST, Self::DEFAULT_HOST.to_string()),
        };

        let port = match lookup(Self::PORT_VAR) {
            Some(raw) => match raw.parse::<u16>() {
                Ok(value) if value != 0 => value,
                Ok(_) => {
                    warn!(
                        "{} must not be 0. Using {}.",
                        Self::PORT_VAR,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
                Err(err) => {
                    warn!(
                        "Could not parse {} ('{}'): {}. Using {}.",
                        Self::PORT_VAR,
                        raw,
                        err,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
            },
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host,
            port,
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Host as configured, for log output.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }
}

/// Defaults for optimization runs.
#[derive(Clone, Debug)]
pub struct OptimizerConfig {
    packing: PackingConfig,
}

impl OptimizerConfig {
    const SUPPORT_RATIO_VAR: &'static str = "LOAD_PLANNER_SUPPORT_RATIO";
    const HEIGHT_EPSILON_VAR: &'static str = "LOAD_PLANNER_HEIGHT_EPSILON";
    const GENERAL_EPSILON_VAR: &'static str = "LOAD_PLANNER_GENERAL_EPSILON";
    const GRID_STEP_VAR: &'static str = "LOAD_PLANNER_GRID_STEP";
    const STRATEGY_VAR: &'static str = "LOAD_PLANNER_STRATEGY";
    const ENFORCE_STACK_WEIGHT_VAR: &'static str = "LOAD_PLANNER_ENFORCE_STACK_WEIGHT";
    const MAX_INSTANCES_VAR: &'static str = "LOAD_PLANNER_MAX_INSTANCES";

    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        let support_ratio = parse_f64_or_default(
            Self::SUPPORT_RATIO_VAR,
            lookup(Self::SUPPORT_RATIO_VAR),
            PackingConfig::DEFAULT_SUPPORT_RATIO,
            |value| (0.0..=1.0).contains(&value),
            "must be between 0 and 1",
        );
        let height_epsilon = parse_f64_or_default(
            Self::HEIGHT_EPSILON_VAR,
            lookup(Self::HEIGHT_EPSILON_VAR),
            PackingConfig::DEFAULT_HEIGHT_EPSILON,
            |value| value > 0.0,
            "must be greater than 0",
        );
        let general_epsilon = parse_f64_or_default(
            Self::GENERAL_EPSILON_VAR,
            lookup(Self::GENERAL_EPSILON_VAR),
            PackingConfig::DEFAULT_GENERAL_EPSILON,
            |value| value > 0.0,
            "must be greater than 0",
        );
        let grid_step = parse_f64_or_default(
            Self::GRID_STEP_VAR,
            lookup(Self::GRID_STEP_VAR),
            PackingConfig::DEFAULT_GRID_STEP,
            |value| value > 0.0,
            "must be greater than 0",
        );

        let strategy = match lookup(Self::STRATEGY_VAR) {
            Some(raw) => StrategyKind::parse(&raw).unwrap_or_else(|| {
                warn!(
                    "Unknown {} ('{}'). Using {}.",
                    Self::STRATEGY_VAR,
                    raw,
                    StrategyKind::default()
                );
                StrategyKind::default()
            }),
            None => StrategyKind::default(),
        };

        let enforce_stack_weight = lookup(Self::ENFORCE_STACK_WEIGHT_VAR)
            .and_then(|raw| parse_bool(&raw, Self::ENFORCE_STACK_WEIGHT_VAR))
            .unwrap_or(PackingConfig::DEFAULT_ENFORCE_STACK_WEIGHT);

        let max_instances = match lookup(Self::MAX_INSTANCES_VAR) {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(value) if value > 0 => value,
                Ok(_) => {
                    warn!(
                        "{} must not be 0. Using {}.",
                        Self::MAX_INSTANCES_VAR,
                        PackingConfig::DEFAULT_MAX_INSTANCES
                    );
                    PackingConfig::DEFAULT_MAX_INSTANCES
                }
                Err(err) => {
                    warn!(
                        "Could not parse {} ('{}'): {}. Using {}.",
                        Self::MAX_INSTANCES_VAR,
                        raw,
                        err,
                        PackingConfig::DEFAULT_MAX_INSTANCES
                    );
                    PackingConfig::DEFAULT_MAX_INSTANCES
                }
            },
            None => PackingConfig::DEFAULT_MAX_INSTANCES,
        };

        let packing = PackingConfig::builder()
            .support_ratio(support_ratio)
            .height_epsilon(height_epsilon)
            .general_epsilon(general_epsilon)
            .grid_step(grid_step)
            .strategy(strategy)
            .enforce_stack_weight(enforce_stack_weight)
            .max_instances(max_instances)
            .build();

        Self { packing }
    }

    pub fn packing_config(&self) -> PackingConfig {
        self.packing
    }
}

/// Trimmed, non-empty value of an environment variable.
fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!("Access to {} failed: {}. Using default value.", name, err);
            None
        }
    }
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            warn!(
                "Could not interpret {} ('{}') as boolean value. Using default value.",
                var_name, other
            );
            None
        }
    }
}

fn parse_f64_or_default(
    var_name: &str,
    raw: Option<String>,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
) -> f64 {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && validator(value) => value,
        Ok(_) => {
            warn!(
                "{} contains invalid value '{}': {}. Using {}.",
                var_name, raw, invalid_hint, default
            );
            default
        }
        Err(err) => {
            warn!(
                "Could not parse {} ('{}') as number: {}. Using {}.",
                var_name, raw, err, default
            );
            default
        }
    }
}
