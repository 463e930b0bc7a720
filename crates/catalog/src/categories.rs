use regex::Regex;

/// One entry of the category table: a machine id, a display label, and the
/// compiled keyword pattern that decides membership. Matching is a plain
/// data-driven regex test — no per-category behavior.
#[derive(Debug)]
pub struct CategoryMatcher {
    id: &'static str,
    label: &'static str,
    pattern: Regex,
}

impl CategoryMatcher {
    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Case-insensitive test of a metric name against this category.
    pub fn is_match(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }
}

/// Fixed, ordered collection of category matchers. Categories are not
/// mutually exclusive: one name may match several entries, or none.
/// Registry order only shows through when output counts tie.
#[derive(Debug)]
pub struct CategoryRegistry {
    matchers: Vec<CategoryMatcher>,
}

/// Keyword table behind [`CategoryRegistry::builtin`]. Each keyword must
/// appear as a whole token (bounded by non-alphanumerics or the string
/// edges), so `cpu` matches `node_cpu_seconds` but not `tcpu_foo`.
const BUILTIN: &[(&str, &str, &[&str])] = &[
    ("cpu", "CPU", &["cpu"]),
    ("memory", "Memory", &["memory", "mem", "heap", "rss"]),
    (
        "latency",
        "Response time",
        &["latency", "duration", "response", "rtt"],
    ),
    (
        "load",
        "Load",
        &["load", "pressure", "saturation", "utilization", "concurrent"],
    ),
    (
        "network",
        "Network",
        &["network", "net", "http", "tcp", "udp", "grpc", "socket"],
    ),
    (
        "queue",
        "Queueing",
        &["queue", "kafka", "rabbitmq", "amqp", "celery"],
    ),
    (
        "database",
        "Database",
        &[
            "db", "database", "sql", "postgres", "mysql", "redis", "mongodb",
        ],
    ),
    (
        "filesystem",
        "Filesystem",
        &["filesystem", "fs", "disk", "file", "inode"],
    ),
    (
        "errors",
        "Errors",
        &["error", "errors", "fail", "failed", "failure", "exception"],
    ),
    (
        "kubernetes",
        "Kubernetes",
        &["kubernetes", "k8s", "kube", "container", "pod", "kubelet"],
    ),
];

impl CategoryRegistry {
    /// Compile the built-in keyword table. Patterns are fixed at build time,
    /// so compilation cannot fail at runtime.
    pub fn builtin() -> Self {
        let matchers = BUILTIN
            .iter()
            .map(|&(id, label, keywords)| CategoryMatcher {
                id,
                label,
                pattern: keyword_pattern(keywords),
            })
            .collect();
        Self { matchers }
    }

    pub fn matchers(&self) -> &[CategoryMatcher] {
        &self.matchers
    }

    /// Display label for a category id, if the registry knows it.
    pub fn label_for(&self, id: &str) -> Option<&'static str> {
        self.matchers
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.label)
    }
}

/// Case-insensitive alternation anchored at token boundaries.
fn keyword_pattern(keywords: &[&str]) -> Regex {
    let pattern = format!(
        "(?i)(?:^|[^a-z0-9])(?:{})(?:[^a-z0-9]|$)",
        keywords.join("|")
    );
    Regex::new(&pattern).expect("built-in category pattern must compile")
}
