/// Label set attached to counters and histograms.
#[derive(Debug, Clone, Default)]
pub struct TelemetryLabels {
    pub service: String,
    pub extra: Vec<(String, String)>,
}

impl TelemetryLabels {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            ..Self::default()
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    /// Flattens the labels into key/value pairs, service first.
    pub fn tags(&self) -> Vec<(String, String)> {
        let mut tags = Vec::with_capacity(1 + self.extra.len());
        tags.push(("service".into(), self.service.clone()));
        for (key, value) in &self.extra {
            tags.push((key.clone(), value.clone()));
        }
        tags
    }
}
