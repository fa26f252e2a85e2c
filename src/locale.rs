use tracing::warn;

use crate::system::history::Category;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl Locale {
    /// Unknown codes fall back to English.
    pub fn from_str_config(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "en" => Locale::En,
            "es" => Locale::Es,
            other => {
                warn!(locale = other, "unsupported locale, falling back to English");
                Locale::En
            }
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Es => "es",
        }
    }
}

/// Display strings for the dashboard charts in one locale.
#[derive(Debug, Clone)]
pub struct Labels {
    pub locale: Locale,
    pub system: &'static str,
    pub received: &'static str,
    pub sent: &'static str,
    pub percent_unit: &'static str,
    pub throughput_unit: &'static str,
}

impl Labels {
    pub fn new(locale: Locale) -> Self {
        match locale {
            Locale::En => Labels {
                locale,
                system: "system",
                received: "received",
                sent: "sent",
                percent_unit: "%",
                throughput_unit: "Mbps",
            },
            Locale::Es => Labels {
                locale,
                system: "sistema",
                received: "recibido",
                sent: "enviado",
                percent_unit: "%",
                throughput_unit: "Mbps",
            },
        }
    }

    /// Chart title.
    pub fn usage(&self, category: Category) -> &'static str {
        match (self.locale, category) {
            (Locale::En, Category::Cpu) => "cpu usage",
            (Locale::En, Category::Gpu) => "gpu usage",
            (Locale::En, Category::Memory) => "memory usage",
            (Locale::En, Category::Network) => "network usage",
            (Locale::Es, Category::Cpu) => "uso de cpu",
            (Locale::Es, Category::Gpu) => "uso de gpu",
            (Locale::Es, Category::Memory) => "uso de memoria",
            (Locale::Es, Category::Network) => "uso de red",
        }
    }

    /// Well-known source keys get a translated name; anything else, such as a
    /// process name or GPU id, is shown as is.
    pub fn series_name<'a>(&self, source: &'a str) -> &'a str {
        match source {
            "system" => self.system,
            "received" => self.received,
            "sent" => self.sent,
            other => other,
        }
    }
}

impl Default for Labels {
    fn default() -> Self {
        Labels::new(Locale::En)
    }
}
