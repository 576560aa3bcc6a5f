use crate::shared::constants::PERSON_CLASS_ID;
use crate::shared::region::BoundingBox;

/// What the detector thinks an object is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Label {
    Person,
    /// Any other class, keyed by the model's class id.
    Other(u32),
}

impl Label {
    pub fn from_class_id(class_id: u32) -> Self {
        if class_id == PERSON_CLASS_ID {
            Label::Person
        } else {
            Label::Other(class_id)
        }
    }
}

/// One object found in a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub label: Label,
    /// In `[0, 1]`.
    pub confidence: f64,
    pub bbox: BoundingBox,
}

/// Whether any detection is a person.
pub fn contains_person(detections: &[Detection]) -> bool {
    detections.iter().any(|d| d.label == Label::Person)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn detection(label: Label) -> Detection {
        Detection {
            label,
            confidence: 0.9,
            bbox: BoundingBox::new(0, 0, 10, 10),
        }
    }

    #[rstest]
    #[case(0, Label::Person)]
    #[case(1, Label::Other(1))]
    #[case(56, Label::Other(56))]
    fn test_from_class_id(#[case] id: u32, #[case] expected: Label) {
        assert_eq!(Label::from_class_id(id), expected);
    }

    #[test]
    fn test_contains_person() {
        assert!(!contains_person(&[]));
        assert!(!contains_person(&[detection(Label::Other(2))]));
        assert!(contains_person(&[
            detection(Label::Other(2)),
            detection(Label::Person)
        ]));
    }
}
