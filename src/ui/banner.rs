// Sat Oct 17 2026 - Alex

use colored::*;

pub struct Banner {
    title: String,
    subtitle: Option<String>,
    version: Option<String>,
    use_color: bool,
    width: usize,
}

impl Banner {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            subtitle: None,
            version: None,
            use_color: true,
            width: 60,
        }
    }

    pub fn with_subtitle(mut self, subtitle: &str) -> Self {
        self.subtitle = Some(subtitle.to_string());
        self
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn with_color(mut self, use_color: bool) -> Self {
        self.use_color = use_color;
        self
    }

    pub fn render(&self) -> String {
        let inner = self.width.saturating_sub(4);
        let rule = "─".repeat(inner + 2);
        let mut lines = vec![format!("╭{}╮", rule)];

        let title = format!("{:^width$}", self.title, width = inner);
        lines.push(if self.use_color {
            format!("│ {} │", title.cyan().bold())
        } else {
            format!("│ {} │", title)
        });

        if let Some(subtitle) = &self.subtitle {
            let line = format!("{:^width$}", subtitle, width = inner);
            lines.push(if self.use_color {
                format!("│ {} │", line.yellow())
            } else {
                format!("│ {} │", line)
            });
        }

        if let Some(version) = &self.version {
            let line = format!("{:^width$}", format!("v{}", version), width = inner);
            lines.push(if self.use_color {
                format!("│ {} │", line.green())
            } else {
                format!("│ {} │", line)
            });
        }

        lines.push(format!("╰{}╯", rule));
        lines.join("\n")
    }

    pub fn print(&self) {
        println!("{}", self.render());
    }

    pub fn print_default(use_color: bool) {
        Self::default().with_color(use_color).print();
    }
}

impl Default for Banner {
    fn default() -> Self {
        Banner::new("UMB RACER")
            .with_subtitle("World Cup 3-Cushion registration race")
            .with_version(env!("CARGO_PKG_VERSION"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_render() {
        let text = Banner::new("UMB RACER").with_version("1.0.0").with_color(false).render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("UMB RACER"));
        assert!(lines[2].contains("v1.0.0"));
        assert!(lines.iter().all(|l| l.chars().count() == 60));
    }
}
