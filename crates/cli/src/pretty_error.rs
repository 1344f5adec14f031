use anyhow::Result;
use codespan_reporting::{
    diagnostic::{Diagnostic, Label, Severity},
    files::SimpleFiles,
    term::{
        self,
        termcolor::{ColorChoice, StandardStream, WriteColor},
    },
};

/// Renders plugin diagnostics against the compiled source file.
pub struct PrettyReporter<'a> {
    name: &'a str,
    source: &'a str,
}

impl<'a> PrettyReporter<'a> {
    pub fn new(name: &'a str, source: &'a str) -> Self {
        Self { name, source }
    }

    pub fn emit_all(&self, diagnostics: &[plugin::Diagnostic], severity: Severity) -> Result<()> {
        let writer = StandardStream::stderr(ColorChoice::Auto);
        let mut writer = writer.lock();
        for diagnostic in diagnostics {
            self.render(diagnostic, severity, &mut writer)?;
        }
        Ok(())
    }

    pub fn render(
        &self,
        diagnostic: &plugin::Diagnostic,
        severity: Severity,
        writer: &mut dyn WriteColor,
    ) -> Result<()> {
        let mut files = SimpleFiles::new();
        let file_id = files.add(self.name, self.source);
        let mut report = Diagnostic::new(severity)
            .with_message(&diagnostic.message)
            .with_code(&diagnostic.name);
        // positions are only known for the component file itself
        match &diagnostic.span {
            Some(span) if diagnostic.file == self.name => {
                let len = self.source.len();
                let range = span.start.min(len)..span.end.min(len);
                report = report.with_labels(vec![
                    Label::primary(file_id, range).with_message(&diagnostic.message)
                ]);
            }
            _ => report = report.with_notes(vec![diagnostic.to_string()]),
        }
        let config = term::Config::default();
        term::emit(writer, &config, &files, &report)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use codespan_reporting::term::termcolor::NoColor;

    fn render(diagnostic: &plugin::Diagnostic, source: &str) -> String {
        let reporter = PrettyReporter::new("App.vue", source);
        let mut out = NoColor::new(Vec::new());
        reporter.render(diagnostic, Severity::Error, &mut out).unwrap();
        String::from_utf8(out.into_inner()).unwrap()
    }

    #[test]
    fn test_labelled() {
        let source = "<template>\n  <div>\n</template>";
        let mut diagnostic = plugin::Diagnostic::new("App.vue", "Element is missing end tag.");
        diagnostic.line = Some(2);
        diagnostic.column = Some(3);
        diagnostic.span = Some(13..18);
        let text = render(&diagnostic, source);
        assert!(text.contains("error[vue-compiler-error]: Element is missing end tag."));
        assert!(text.contains("App.vue:2:3"));
    }

    #[test]
    fn test_other_file() {
        let mut diagnostic = plugin::Diagnostic::new("a.css", "Unclosed block.");
        diagnostic.span = Some(0..1);
        let text = render(&diagnostic, "<style src=\"./a.css\"></style>");
        assert!(text.contains("= a.css: Unclosed block."));
    }
}
