//! Static registry of tracked document categories.
//!
//! The set is closed and known at deploy time; it is configuration, not a
//! database table. The submission tracker derives its matrix columns from
//! this list, in this order.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Category {
    pub key: &'static str,
    pub display_name: &'static str,
}

pub const CATEGORIES: &[Category] = &[
    Category {
        key: "ipcr_target",
        display_name: "IPCR Target",
    },
    Category {
        key: "ipcr_accomplishment",
        display_name: "IPCR Accomplishment",
    },
    Category {
        key: "workload",
        display_name: "Workload",
    },
    Category {
        key: "course_syllabus",
        display_name: "Course Syllabus",
    },
    Category {
        key: "class_record",
        display_name: "Class Record",
    },
    Category {
        key: "grading_sheet",
        display_name: "Grading Sheet",
    },
    Category {
        key: "exam_questionnaire",
        display_name: "Exam Questionnaire",
    },
    Category {
        key: "consultation_log",
        display_name: "Consultation Log",
    },
];

pub fn all() -> &'static [Category] {
    CATEGORIES
}

pub fn find(key: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|category| category.key == key)
}

pub fn is_known(key: &str) -> bool {
    find(key).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_keys_are_unique() {
        for (index, category) in CATEGORIES.iter().enumerate() {
            assert!(
                !CATEGORIES[index + 1..]
                    .iter()
                    .any(|other| other.key == category.key),
                "duplicate category key {}",
                category.key
            );
        }
    }

    #[test]
    fn lookup_by_key() {
        assert_eq!(find("workload").unwrap().display_name, "Workload");
        assert!(is_known("course_syllabus"));
        assert!(!is_known("unknown_category"));
    }
}
