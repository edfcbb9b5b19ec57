//! Mock metric sources for testing

use crate::power::PowerMetricSource;
use crate::process::{ProcessMetricSource, ProcessUsage};
use async_trait::async_trait;
use std::collections::VecDeque;

/// Process source returning one fixed reading forever
pub struct FixedProcessSource {
    usage: ProcessUsage,
}

impl FixedProcessSource {
    pub fn new(cpu_percent: f64, memory_mb: f64) -> Self {
        Self {
            usage: ProcessUsage {
                cpu_percent,
                memory_mb,
            },
        }
    }
}

#[async_trait]
impl ProcessMetricSource for FixedProcessSource {
    async fn usage(&mut self) -> ProcessUsage {
        self.usage
    }
}

/// Process source replaying a scripted sequence, then zeros
pub struct ScriptedProcessSource {
    readings: VecDeque<ProcessUsage>,
}

impl ScriptedProcessSource {
    pub fn new(readings: impl IntoIterator<Item = (f64, f64)>) -> Self {
        Self {
            readings: readings
                .into_iter()
                .map(|(cpu_percent, memory_mb)| ProcessUsage {
                    cpu_percent,
                    memory_mb,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl ProcessMetricSource for ScriptedProcessSource {
    async fn usage(&mut self) -> ProcessUsage {
        self.readings.pop_front().unwrap_or_default()
    }
}

/// Power source returning one fixed reading forever
pub struct FixedPowerSource {
    power_mw: f64,
}

impl FixedPowerSource {
    pub fn new(power_mw: f64) -> Self {
        Self { power_mw }
    }
}

#[async_trait]
impl PowerMetricSource for FixedPowerSource {
    async fn power_mw(&mut self, _engine_cpu_percent: f64) -> f64 {
        self.power_mw
    }
}

/// Power source replaying a scripted sequence, then zeros
pub struct ScriptedPowerSource {
    readings: VecDeque<f64>,
}

impl ScriptedPowerSource {
    pub fn new(readings: impl IntoIterator<Item = f64>) -> Self {
        Self {
            readings: readings.into_iter().collect(),
        }
    }
}

#[async_trait]
impl PowerMetricSource for ScriptedPowerSource {
    async fn power_mw(&mut self, _engine_cpu_percent: f64) -> f64 {
        self.readings.pop_front().unwrap_or(0.0)
    }
}
