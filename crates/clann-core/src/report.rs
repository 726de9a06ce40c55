//! Plain-text annotation usage report.
//!
//! ```text
//! - class: com.example.Foo
//!   - @java.lang.Deprecated
//!     - [CLASS, FIELD]
//! ```

use std::fmt::Write;

use crate::ledger::ClassAnnotations;

/// Renders the annotation usage of `classes`.
///
/// Classes without annotations are omitted. Classes keep their input order;
/// annotations are sorted by name and levels follow the taxonomy order.
#[must_use]
pub fn format_report<'a, I>(classes: I) -> String
where
    I: IntoIterator<Item = &'a ClassAnnotations>,
{
    let mut report = String::new();

    for class in classes {
        if class.is_empty() {
            continue;
        }
        let _ = writeln!(report, "- class: {}", class.class_name());
        for (name, details) in class.annotations() {
            let _ = writeln!(report, "  - {name}");
            let _ = writeln!(report, "    - {details}");
        }
    }

    report
}
