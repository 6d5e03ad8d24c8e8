//! Association class modules for many-to-many relationships.

use crate::ir::{AssociationClass, Model};

use super::class::FILE_HEADER;
use super::py_types::{attribute_initializer, py_ident, py_string};

/// Generates `models/<PyName>.py` for an association class.
pub fn generate_association(model: &Model, assoc: &AssociationClass) -> String {
    let from = model.class(assoc.from);
    let to = model.class(assoc.to);
    let from_ref = format!("{}_ref", from.key_letters);
    let to_ref = format!("{}_ref", to.key_letters);
    let rel = py_string(&assoc.rel_id);

    let mut code = String::new();
    code.push_str(&format!("# models/{}.py\n{}", assoc.py_name, FILE_HEADER));
    code.push_str(
        r#"from __future__ import annotations

from typing import Any, Optional

from runtime.base import InstanceBase
"#,
    );

    code.push_str(&format!("\n\nclass {}(InstanceBase):\n", assoc.py_name));
    code.push_str(&format!(
        "    \"\"\"Association class for {}: {} <-> {}.\"\"\"\n\n",
        assoc.rel_id, from.name, to.name
    ));
    code.push_str(&format!("    kl = {}\n", py_string(&assoc.key_letters)));
    code.push_str(&format!("    model_name = {}\n", py_string(&assoc.name)));
    code.push_str("    is_association = True\n");
    code.push_str(&format!("    rel_id = {}\n", rel));

    code.push_str("\n    def __init__(self, rt, id: Optional[str] = None):\n");
    code.push_str("        super().__init__(rt, id)\n");
    code.push_str(&format!("        self.set_attr({}, None)\n", py_string(&from_ref)));
    code.push_str(&format!("        self.set_attr({}, None)\n", py_string(&to_ref)));
    for attribute in &assoc.attributes {
        code.push_str(&format!(
            "        self.set_attr({}, {})  # {}\n",
            py_string(&attribute.name),
            attribute_initializer(attribute),
            attribute.data_type
        ));
    }
    code.push_str(&format!(
        "        rt.store.create({}, self._id, self)\n",
        py_string(&assoc.py_name)
    ));

    code.push_str(&format!(
        r#"
    @classmethod
    def create_link(cls, rt, from_inst: Any, to_inst: Any, **attrs: Any) -> Optional["{name}"]:
        """Creates the association instance and links both ends across {rel_id}."""
        if from_inst is None or to_inst is None:
            return None
        assoc = cls(rt)
        assoc.set_attr({from_ref}, from_inst)
        assoc.set_attr({to_ref}, to_inst)
        for key, value in attrs.items():
            assoc.set_attr(key, value)
        rt.links.relate_all({rel}, [(from_inst, assoc), (assoc, to_inst)])
        return assoc

    def get_from(self) -> Any:
        return self.get_attr({from_ref})

    def get_to(self) -> Any:
        return self.get_attr({to_ref})
"#,
        name = assoc.py_name,
        rel_id = assoc.rel_id,
        from_ref = py_string(&from_ref),
        to_ref = py_string(&to_ref),
        rel = rel,
    ));

    let from_getter = format!("get_{}", py_ident(&from.name).to_lowercase());
    let to_getter = format!("get_{}", py_ident(&to.name).to_lowercase());
    if from_getter != to_getter {
        code.push_str(&format!(
            "\n    def {}(self) -> Any:\n        return self.get_from()\n",
            from_getter
        ));
        code.push_str(&format!(
            "\n    def {}(self) -> Any:\n        return self.get_to()\n",
            to_getter
        ));
    }

    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Attribute, Class, ClassId, OalType};
    use serde_json::json;

    fn make_class(name: &str, kl: &str) -> Class {
        Class {
            id: name.to_string(),
            name: name.to_string(),
            key_letters: kl.to_string(),
            py_name: name.to_string(),
            ..Default::default()
        }
    }

    fn make_assoc(from: usize, to: usize) -> AssociationClass {
        AssociationClass {
            name: "Student_Course_R1".into(),
            py_name: "Student_Course_R1".into(),
            key_letters: "Student_Course_R1".into(),
            rel_id: "R1".into(),
            from: ClassId(from),
            to: ClassId(to),
            attributes: vec![Attribute {
                name: "grade".into(),
                data_type: OalType::String,
                default_value: Some(json!("A")),
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_association_module() {
        let model = Model {
            classes: vec![make_class("Student", "STU"), make_class("Course", "CRS")],
            ..Default::default()
        };
        let code = generate_association(&model, &make_assoc(0, 1));

        assert!(code.starts_with("# models/Student_Course_R1.py\n"));
        assert!(code.contains("class Student_Course_R1(InstanceBase):"));
        assert!(code.contains("    is_association = True\n"));
        assert!(code.contains("        self.set_attr(\"STU_ref\", None)\n"));
        assert!(code.contains("        self.set_attr(\"grade\", \"A\")  # string\n"));
        assert!(code.contains(
            "        rt.links.relate_all(\"R1\", [(from_inst, assoc), (assoc, to_inst)])\n"
        ));
        assert!(code.contains("    def get_student(self) -> Any:\n"));
        assert!(code.contains("    def get_course(self) -> Any:\n"));
    }

    #[test]
    fn test_reflexive_association_has_only_end_getters() {
        let model = Model {
            classes: vec![make_class("Person", "PER")],
            ..Default::default()
        };
        let code = generate_association(&model, &make_assoc(0, 0));
        assert!(code.contains("def get_from(self)"));
        assert!(!code.contains("def get_person(self)"));
    }
}
