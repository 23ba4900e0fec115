// src/common/clock.rs

use chrono::{DateTime, Utc};

/// Fonte de tempo injetável.
///
/// Produção usa `SystemClock`; os testes usam `FixedClock` para tornar
/// determinístico o que é "passado" e o que é "futuro".
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    time: DateTime<Utc>,
}

#[cfg(test)]
impl FixedClock {
    pub const fn new(time: DateTime<Utc>) -> Self {
        Self { time }
    }

    /// Atalho para os testes: "2025-06-02T08:00:00Z" (uma segunda-feira).
    pub fn at(rfc3339: &str) -> Self {
        let time = DateTime::parse_from_rfc3339(rfc3339)
            .expect("timestamp de teste inválido")
            .with_timezone(&Utc);
        Self::new(time)
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.time
    }
}
