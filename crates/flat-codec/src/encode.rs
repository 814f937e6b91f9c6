//! Encode driver: nested values to segment instances

use crate::schema::Schema;
use crate::segment::SegmentInstance;
use crate::{Error, Result};
use flat_ir::{Entry, Record, Value};
use tracing::trace;

impl Schema {
    /// Build the instances of a segment and of its declared children.
    ///
    /// Child values are taken out of `values` first: a list builds one child
    /// per element (for `multiple` children only), a record builds one child.
    /// What remains is stored in the segment itself. The parent instance
    /// comes first, followed by its children in declaration order.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownSegmentName`] if `name` is not a segment
    /// - [`Error::InvalidValue`] for child values of the wrong shape
    /// - errors of [`crate::Segment::instantiate`]
    pub fn build(&self, name: &str, mut values: Record) -> Result<Vec<SegmentInstance>> {
        let segment = self.segment(name)?;
        let mut children = Vec::new();

        for child_name in self.children(name) {
            let Some(entry) = values.remove(child_name) else {
                continue;
            };
            let child = self.segment(child_name)?;

            match entry {
                Entry::List(items) if child.multiple => {
                    for item in items {
                        children.extend(self.build(child_name, item)?);
                    }
                }
                Entry::List(items) => {
                    return Err(Error::invalid_value(
                        name,
                        child_name,
                        format!("'{child_name}' occurs once but {} records were given", items.len()),
                    ));
                }
                Entry::Record(record) => children.extend(self.build(child_name, record)?),
                Entry::Value(Value::Null) => {}
                Entry::Value(other) => {
                    return Err(Error::invalid_value(
                        name,
                        child_name,
                        format!("expected a record, got a {}", other.type_name()),
                    ));
                }
            }
        }

        let instance = segment.instantiate(values)?;
        trace!(segment = name, children = children.len(), "Built segment");

        let mut instances = Vec::with_capacity(children.len() + 1);
        instances.push(instance);
        instances.extend(children);
        Ok(instances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flat_schema::{ElementDescription, SchemaDescription, SegmentDescription};

    fn schema() -> Schema {
        let description = SchemaDescription::new("orders")
            .with_method("first-1")
            .add_segment(
                SegmentDescription::new("Lines")
                    .multiple(true)
                    .add_element(ElementDescription::new("Tag", 1).with_default("L"))
                    .add_element(ElementDescription::new("Code", 3)),
            )
            .add_segment(
                SegmentDescription::new("Lots")
                    .multiple(true)
                    .with_parent("Lines")
                    .add_element(ElementDescription::new("Tag", 1).with_default("N"))
                    .add_element(ElementDescription::new("Lot", 3)),
            )
            .add_segment(
                SegmentDescription::new("Detail")
                    .with_parent("Lines")
                    .add_element(ElementDescription::new("Tag", 1).with_default("D"))
                    .add_element(ElementDescription::new("Info", 3)),
            );
        Schema::with_builtins(&description).unwrap()
    }

    fn names(instances: &[SegmentInstance]) -> Vec<&str> {
        instances.iter().map(SegmentInstance::name).collect()
    }

    #[test]
    fn test_build_parent_first() {
        let schema = schema();
        let values = Record::new()
            .with("Code", "A01")
            .with(
                "Lots",
                vec![Record::new().with("Lot", "x"), Record::new().with("Lot", "y")],
            )
            .with("Detail", Record::new().with("Info", "z"));

        let instances = schema.build("Lines", values).unwrap();
        assert_eq!(names(&instances), vec!["Lines", "Lots", "Lots", "Detail"]);
        assert_eq!(instances[0].value("Code"), Some(&Value::from("A01")));
        assert_eq!(instances[2].value("Lot"), Some(&Value::from("y")));
    }

    #[test]
    fn test_build_without_children() {
        let instances = schema().build("Lines", Record::new().with("Code", "A")).unwrap();
        assert_eq!(names(&instances), vec!["Lines"]);

        let instances = schema()
            .build("Lines", Record::new().with("Detail", Value::Null))
            .unwrap();
        assert_eq!(instances.len(), 1);
    }

    #[test]
    fn test_build_errors() {
        let schema = schema();
        assert_eq!(
            schema.build("Nope", Record::new()).unwrap_err(),
            Error::UnknownSegmentName("Nope".into())
        );
        assert!(matches!(
            schema.build("Lines", Record::new().with("Detail", vec![Record::new()])),
            Err(Error::InvalidValue { .. })
        ));
        assert!(matches!(
            schema.build("Lines", Record::new().with("Lots", "x")),
            Err(Error::InvalidValue { .. })
        ));
        assert!(matches!(
            schema.build("Lines", Record::new().with("Unknown", "x")),
            Err(Error::UnknownElement { .. })
        ));
    }
}
