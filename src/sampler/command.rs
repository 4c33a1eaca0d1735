use tracing::info;

use crate::error::{PortaError, Result};
use crate::models::{Category, Configuration};
use crate::tuner::constants::{
    CPU_QUOTA_PARAM, DEFAULT_CPUSET, DEFAULT_IMAGE, MEMORY_WRAPPER, MEM_BW_PARAM,
};

/// Turns a candidate configuration into an external benchmark invocation.
pub trait CommandBuilder {
    fn build(
        &self,
        category: Category,
        benchmarks: &[String],
        configuration: &Configuration,
    ) -> Result<String>;

    /// Called once a category has been tuned, before the next one starts.
    fn record_tuned(&mut self, _category: Category, _best: &Configuration) {}
}

impl<B: CommandBuilder + ?Sized> CommandBuilder for &mut B {
    fn build(
        &self,
        category: Category,
        benchmarks: &[String],
        configuration: &Configuration,
    ) -> Result<String> {
        (**self).build(category, benchmarks, configuration)
    }

    fn record_tuned(&mut self, category: Category, best: &Configuration) {
        (**self).record_tuned(category, best)
    }
}

/// Builds `docker run` invocations of the microbenchmark image.
#[derive(Debug, Clone, PartialEq)]
pub struct DockerCommandBuilder {
    pub image: String,
    pub cpuset: String,
    /// Passed as `--cpu-period` when set.
    pub cpu_period: Option<u64>,
    /// Program wrapping `docker run` that enforces the bandwidth limit.
    pub memory_wrapper: String,
    /// Arguments given to the wrapper ahead of the bandwidth value.
    pub wrapper_args: Vec<String>,
    /// Quota applied to memory runs; also updated from a tuned processor run
    /// when `pin_cpu_quota` is set.
    pub cpu_quota: Option<i64>,
    pub pin_cpu_quota: bool,
}

impl Default for DockerCommandBuilder {
    fn default() -> Self {
        Self {
            image: DEFAULT_IMAGE.to_string(),
            cpuset: DEFAULT_CPUSET.to_string(),
            cpu_period: None,
            memory_wrapper: MEMORY_WRAPPER.to_string(),
            wrapper_args: Vec::new(),
            cpu_quota: None,
            pin_cpu_quota: false,
        }
    }
}

fn required(configuration: &Configuration, name: &str) -> Result<i64> {
    configuration.get(name).ok_or_else(|| {
        PortaError::InvalidInput(format!(
            "configuration {{{}}} has no value for {}",
            configuration.display(),
            name
        ))
    })
}

impl DockerCommandBuilder {
    /// Unrestricted run used to capture reference results.
    pub fn reference_command(&self, benchmarks: &[String]) -> String {
        format!(
            "docker run --rm --cpuset-cpus={} -e BENCHMARKS=\"{}\" {}",
            self.cpuset,
            benchmarks.join(" "),
            self.image
        )
    }

    fn period_flag(&self) -> String {
        self.cpu_period
            .map(|p| format!(" --cpu-period={}", p))
            .unwrap_or_default()
    }

    fn tail(&self, benchmarks: &[String]) -> String {
        format!(
            " -e BENCHMARKS=\"{}\" --rm {}",
            benchmarks.join(" "),
            self.image
        )
    }
}

impl CommandBuilder for DockerCommandBuilder {
    fn build(
        &self,
        category: Category,
        benchmarks: &[String],
        configuration: &Configuration,
    ) -> Result<String> {
        match category {
            Category::Processor => {
                let quota = required(configuration, CPU_QUOTA_PARAM)?;
                Ok(format!(
                    "docker run --cpuset-cpus={} --cpu-quota={}{}{}",
                    self.cpuset,
                    quota,
                    self.period_flag(),
                    self.tail(benchmarks)
                ))
            }
            Category::Memory => {
                let limit = required(configuration, MEM_BW_PARAM)?;
                let quota_flag = match (self.pin_cpu_quota, self.cpu_quota) {
                    (_, Some(q)) => format!(" --cpu-quota={}", q),
                    (true, None) => {
                        return Err(PortaError::MissingCpuQuota(category.to_string()))
                    }
                    (false, None) => String::new(),
                };

                let mut wrapper = self.memory_wrapper.clone();
                for arg in &self.wrapper_args {
                    wrapper.push(' ');
                    wrapper.push_str(arg);
                }

                Ok(format!(
                    "{} {} --cpuset-cpus={}{}{}{}",
                    wrapper,
                    limit,
                    self.cpuset,
                    quota_flag,
                    self.period_flag(),
                    self.tail(benchmarks)
                ))
            }
        }
    }

    fn record_tuned(&mut self, category: Category, best: &Configuration) {
        if category == Category::Processor && self.pin_cpu_quota {
            if let Some(quota) = best.get(CPU_QUOTA_PARAM) {
                info!(quota, "pinning tuned cpu quota for later categories");
                self.cpu_quota = Some(quota);
            }
        }
    }
}
