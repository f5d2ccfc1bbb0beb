//! # List Filtering
//!
//! The search boxes above each table filter the already-loaded list in
//! memory. Matching is a case-insensitive substring test over a fixed set of
//! fields per record type.

use crate::types::{Book, LoanRecord, Student};

/// A record that can be matched by the search box.
pub trait Searchable {
    /// Text fields the search box looks at.
    fn search_fields(&self) -> Vec<&str>;

    /// Whether any field contains `needle`, which must already be lowercase.
    fn matches(&self, needle: &str) -> bool {
        self.search_fields()
            .into_iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

impl Searchable for Student {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.student_id.as_str(),
            self.name.as_str(),
            self.email.as_str(),
        ];
        fields.extend(self.department.as_deref());
        fields
    }
}

impl Searchable for Book {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.isbn.as_str(), self.title.as_str(), self.author.as_str()];
        fields.extend(self.category.as_deref());
        fields
    }
}

impl Searchable for LoanRecord {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.student_id.as_str(), self.isbn.as_str(), self.status.as_str()];
        fields.extend(self.student_name.as_deref());
        fields.extend(self.book_title.as_deref());
        fields
    }
}

/// Returns the records matching `query`, preserving order.
///
/// A blank query returns every record.
pub fn filter_records<T: Searchable + Clone>(records: &[T], query: &str) -> Vec<T> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return records.to_vec();
    }

    records
        .iter()
        .filter(|record| record.matches(&needle))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionStatus;
    use chrono::Utc;

    fn student(id: &str, name: &str, department: Option<&str>) -> Student {
        Student {
            id: 1,
            student_id: id.into(),
            name: name.into(),
            email: format!("{}@school.edu", id.to_lowercase()),
            phone: Some("555-0101".into()),
            department: department.map(Into::into),
            year: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_student_filter_fields() {
        let students = vec![
            student("S1", "Ada Lovelace", Some("Mathematics")),
            student("S2", "Alan Turing", Some("Computer Science")),
            student("S3", "Grace Hopper", None),
        ];

        let hits = filter_records(&students, "ada");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].student_id, "S1");

        assert_eq!(filter_records(&students, "COMPUTER").len(), 1);
        assert_eq!(filter_records(&students, "s3@").len(), 1);
        // phone is not a search field
        assert!(filter_records(&students, "555").is_empty());
        assert_eq!(filter_records(&students, "   ").len(), 3);
    }

    #[test]
    fn test_loan_filter_includes_joined_names() {
        let record = LoanRecord {
            id: 9,
            student_id: "S1".into(),
            student_name: Some("Ada Lovelace".into()),
            isbn: "X1".into(),
            book_title: None,
            issue_date: Utc::now(),
            due_date: None,
            return_date: None,
            status: TransactionStatus::Returned,
        };
        let records = vec![record];

        assert_eq!(filter_records(&records, "lovelace").len(), 1);
        assert_eq!(filter_records(&records, "returned").len(), 1);
        assert!(filter_records(&records, "issued").is_empty());
    }
}
