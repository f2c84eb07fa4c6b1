//! Curriculum catalog backed by a JSON file.
//!
//! Reads are tolerant of the several layouts the catalog file has had over
//! time. Writes only accept the plain list layout and are serialised through
//! a mutex so concurrent admin edits cannot interleave.

use crate::error::{IngestError, IngestResult};
use scholar_config::CatalogConfig;
use scholar_core::Course;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Keys that may hold the course list when the file is an object.
const LIST_KEYS: &[&str] = &["computer_science_courses", "courses", "classes"];

/// File-backed course catalog.
pub struct CourseCatalog {
    classes_path: PathBuf,
    resources_path: PathBuf,
    write_lock: Mutex<()>,
}

impl CourseCatalog {
    pub fn new(classes_path: impl Into<PathBuf>, resources_path: impl Into<PathBuf>) -> Self {
        Self {
            classes_path: classes_path.into(),
            resources_path: resources_path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::new(config.classes_path(), config.resources_path())
    }

    pub fn classes_path(&self) -> &Path {
        &self.classes_path
    }

    /// All courses. A missing file is an empty catalog.
    pub fn list(&self) -> IngestResult<Vec<Course>> {
        let Some(data) = read_optional_json(&self.classes_path)? else {
            return Ok(vec![]);
        };

        let entries = match extract_course_list(&data) {
            Some(entries) => entries,
            None => {
                warn!("No course list found in {:?}", self.classes_path);
                return Ok(vec![]);
            }
        };

        let mut courses = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<Course>(entry.clone()) {
                Ok(course) => courses.push(course),
                Err(e) => warn!("Skipping malformed course entry: {}", e),
            }
        }
        Ok(courses)
    }

    /// One course by code (case-insensitive).
    pub fn get(&self, code: &str) -> IngestResult<Course> {
        self.list()?
            .into_iter()
            .find(|c| c.has_code(code))
            .ok_or_else(|| IngestError::CourseNotFound(code.to_string()))
    }

    /// Append a course. The code must not already exist.
    pub fn add(&self, course: &Course) -> IngestResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut entries = self.read_writable_list()?;
        if entries.iter().any(|e| entry_has_code(e, &course.course_code)) {
            return Err(IngestError::DuplicateCourse(course.course_code.clone()));
        }

        entries.push(serde_json::to_value(course)?);
        self.write_list(&entries)?;
        info!("Added course {}", course.course_code);
        Ok(())
    }

    /// Replace the course stored under `code`.
    pub fn update(&self, code: &str, course: &Course) -> IngestResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut entries = self.read_writable_list()?;
        let slot = entries
            .iter_mut()
            .find(|e| entry_has_code(e, code))
            .ok_or_else(|| IngestError::CourseNotFound(code.to_string()))?;
        *slot = serde_json::to_value(course)?;

        self.write_list(&entries)?;
        info!("Updated course {}", code);
        Ok(())
    }

    /// Remove the course stored under `code`.
    pub fn delete(&self, code: &str) -> IngestResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let entries = self.read_writable_list()?;
        let before = entries.len();
        let remaining: Vec<Value> = entries
            .into_iter()
            .filter(|e| !entry_has_code(e, code))
            .collect();

        if remaining.len() == before {
            return Err(IngestError::CourseNotFound(code.to_string()));
        }

        self.write_list(&remaining)?;
        info!("Deleted course {}", code);
        Ok(())
    }

    /// The `helpful_links` object of the student support section, or `{}`.
    pub fn resources(&self) -> IngestResult<Value> {
        let Some(data) = read_optional_json(&self.resources_path)? else {
            return Ok(Value::Object(Default::default()));
        };

        Ok(data
            .get("academic_and_student_support")
            .and_then(|s| s.get("helpful_links"))
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default())))
    }

    fn file_name(&self) -> String {
        self.classes_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("catalog")
            .to_string()
    }

    fn read_writable_list(&self) -> IngestResult<Vec<Value>> {
        match read_optional_json(&self.classes_path)? {
            None => Ok(vec![]),
            Some(Value::Array(entries)) => Ok(entries),
            Some(_) => Err(IngestError::MalformedCatalog(self.file_name())),
        }
    }

    fn write_list(&self, entries: &[Value]) -> IngestResult<()> {
        if let Some(parent) = self.classes_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.classes_path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.classes_path)?;
        debug!("Wrote {} courses to {:?}", entries.len(), self.classes_path);
        Ok(())
    }
}

fn read_optional_json(path: &Path) -> IngestResult<Option<Value>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Find the course list in any of the accepted layouts.
fn extract_course_list(data: &Value) -> Option<&Vec<Value>> {
    if let Value::Array(entries) = data {
        return Some(entries);
    }

    for key in LIST_KEYS {
        if let Some(Value::Array(entries)) = data.get(key) {
            return Some(entries);
        }
    }

    data.get("computer_science_courses")
        .and_then(|cs| cs.get("computer_science_courses"))
        .and_then(|v| v.as_array())
}

fn entry_has_code(entry: &Value, code: &str) -> bool {
    entry
        .get("course_code")
        .and_then(|c| c.as_str())
        .map(|c| c.trim().eq_ignore_ascii_case(code.trim()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn course(code: &str) -> Course {
        Course {
            course_code: code.to_string(),
            course_name: format!("{} name", code),
            credits: 3,
            prerequisites: vec![],
            offered: vec!["Fall".to_string()],
        }
    }

    fn catalog_with(dir: &TempDir, classes: Option<&str>) -> CourseCatalog {
        let classes_path = dir.path().join("classes.json");
        if let Some(content) = classes {
            std::fs::write(&classes_path, content).unwrap();
        }
        CourseCatalog::new(classes_path, dir.path().join("resources.json"))
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog_with(&dir, None);
        assert!(catalog.list().unwrap().is_empty());
        assert_eq!(catalog.resources().unwrap(), serde_json::json!({}));
    }

    #[test]
    fn test_tolerant_layouts() {
        let entry = r#"{"course_code": "COSC 111", "course_name": "Intro", "credits": 4}"#;
        let layouts = [
            format!("[{}]", entry),
            format!(r#"{{"courses": [{}]}}"#, entry),
            format!(r#"{{"classes": [{}]}}"#, entry),
            format!(r#"{{"computer_science_courses": [{}]}}"#, entry),
            format!(
                r#"{{"computer_science_courses": {{"computer_science_courses": [{}]}}}}"#,
                entry
            ),
        ];

        for layout in layouts {
            let dir = TempDir::new().unwrap();
            let catalog = catalog_with(&dir, Some(&layout));
            let courses = catalog.list().unwrap();
            assert_eq!(courses.len(), 1, "layout: {}", layout);
            assert_eq!(courses[0].course_code, "COSC 111");
        }
    }

    #[test]
    fn test_unparsable_file_is_error() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog_with(&dir, Some("[{"));
        let err = catalog.list().unwrap_err();
        assert!(matches!(err, IngestError::Json(_)));
        assert!(err.to_string().starts_with("JSON parse error"));
    }

    #[test]
    fn test_add_update_delete() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog_with(&dir, Some("[]"));

        catalog.add(&course("COSC 111")).unwrap();
        catalog.add(&course("COSC 112")).unwrap();
        assert_eq!(catalog.list().unwrap().len(), 2);

        let err = catalog.add(&course("cosc 111")).unwrap_err();
        assert!(matches!(err, IngestError::DuplicateCourse(_)));

        let mut renamed = course("COSC 112");
        renamed.course_name = "Data Structures".to_string();
        catalog.update("COSC 112", &renamed).unwrap();
        assert_eq!(catalog.get("cosc 112").unwrap().course_name, "Data Structures");

        catalog.delete("COSC 111").unwrap();
        let err = catalog.delete("COSC 111").unwrap_err();
        assert_eq!(err.to_string(), "COSC 111 not found");
        assert_eq!(catalog.list().unwrap().len(), 1);
    }

    #[test]
    fn test_writes_require_plain_list() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog_with(&dir, Some(r#"{"courses": []}"#));

        let err = catalog.add(&course("COSC 111")).unwrap_err();
        assert_eq!(err.to_string(), "classes.json malformed");
    }

    #[test]
    fn test_add_creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog_with(&dir, None);

        catalog.add(&course("MATH 241")).unwrap();
        assert!(catalog.classes_path().exists());
        assert_eq!(catalog.get("MATH 241").unwrap().credits, 3);
    }

    #[test]
    fn test_update_missing_course() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog_with(&dir, Some("[]"));
        let err = catalog.update("NOPE 100", &course("NOPE 100")).unwrap_err();
        assert!(matches!(err, IngestError::CourseNotFound(_)));
    }

    #[test]
    fn test_resources_links() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog_with(&dir, None);
        std::fs::write(
            dir.path().join("resources.json"),
            r#"{"academic_and_student_support": {"helpful_links": {"Library": "https://lib.example.edu"}}}"#,
        )
        .unwrap();

        let links = catalog.resources().unwrap();
        assert_eq!(links["Library"], "https://lib.example.edu");
    }
}
