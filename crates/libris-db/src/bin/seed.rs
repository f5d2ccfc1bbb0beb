//! # Seed Data Generator
//!
//! Populates a library database with sample students and books for
//! development.
//!
//! ## Usage
//! ```bash
//! # 40 students, every sample title (default)
//! cargo run -p libris-db --bin seed
//!
//! # Custom student count
//! cargo run -p libris-db --bin seed -- --students 200
//!
//! # Specify database path
//! cargo run -p libris-db --bin seed -- --db ./data/library.db
//! ```
//!
//! ## Generated Data
//! - Students `STU-0001 ...` spread over departments and years
//! - One book per sample title, 1 to 5 copies each
//! - A handful of open loans, so the dashboard shows issued copies

use chrono::Utc;
use std::env;

use libris_core::{BookInput, StudentInput};
use libris_db::{Database, DbConfig};

/// Sample catalogue: (isbn, title, author, publisher, category)
const BOOKS: &[(&str, &str, &str, &str, &str)] = &[
    ("978-1718503106", "The Rust Programming Language", "Steve Klabnik", "No Starch Press", "Programming"),
    ("978-1492052593", "Programming Rust", "Jim Blandy", "O'Reilly", "Programming"),
    ("978-0262033848", "Introduction to Algorithms", "Thomas H. Cormen", "MIT Press", "Computer Science"),
    ("978-0131103627", "The C Programming Language", "Brian W. Kernighan", "Prentice Hall", "Programming"),
    ("978-0201633610", "Design Patterns", "Erich Gamma", "Addison-Wesley", "Software Engineering"),
    ("978-0132350884", "Clean Code", "Robert C. Martin", "Prentice Hall", "Software Engineering"),
    ("978-0486282114", "Calculus Made Easy", "Silvanus P. Thompson", "Dover", "Mathematics"),
    ("978-0387310732", "Pattern Recognition and Machine Learning", "Christopher Bishop", "Springer", "Computer Science"),
    ("978-0141439518", "Pride and Prejudice", "Jane Austen", "Penguin Classics", "Literature"),
    ("978-0451524935", "1984", "George Orwell", "Signet Classics", "Literature"),
    ("978-0553380163", "A Brief History of Time", "Stephen Hawking", "Bantam", "Physics"),
    ("978-0465026562", "Godel, Escher, Bach", "Douglas Hofstadter", "Basic Books", "Philosophy"),
];

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Grace", "Edsger", "Barbara", "Donald", "Margaret", "Linus",
    "Frances", "Dennis",
];

const LAST_NAMES: &[&str] = &[
    "Lovelace", "Turing", "Hopper", "Dijkstra", "Liskov", "Knuth", "Hamilton", "Torvalds",
];

const DEPARTMENTS: &[&str] = &["Computer Science", "Mathematics", "Physics", "Literature"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut student_count: usize = 40;
    let mut db_path = String::from("./library_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--students" | "-s" => {
                if i + 1 < args.len() {
                    student_count = args[i + 1].parse().unwrap_or(40);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Libris Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --students <N>  Number of students to generate (default: 40)");
                println!("  -d, --db <PATH>     Database file path (default: ./library_dev.db)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Libris Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!("Students: {}", student_count);
    println!();

    let db = Database::open(DbConfig::new(&db_path)).await?;
    println!("✓ Database loaded");

    let existing = db.students().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} students", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();

    for n in 0..student_count {
        let first = FIRST_NAMES[n % FIRST_NAMES.len()];
        let last = LAST_NAMES[(n / FIRST_NAMES.len()) % LAST_NAMES.len()];
        let student = StudentInput {
            student_id: format!("STU-{:04}", n + 1),
            name: format!("{} {}", first, last),
            email: format!("{}.{}{}@school.edu", first.to_lowercase(), last.to_lowercase(), n + 1),
            phone: Some(format!("555-{:04}", 1000 + n)),
            department: Some(DEPARTMENTS[n % DEPARTMENTS.len()].to_string()),
            year: Some(((n % 4) + 1).to_string()),
        };

        if let Err(e) = db.students().insert(&student).await {
            eprintln!("Failed to insert {}: {}", student.student_id, e);
        }
    }
    println!("✓ Generated {} students", student_count);

    for (idx, (isbn, title, author, publisher, category)) in BOOKS.iter().enumerate() {
        let book = BookInput {
            isbn: isbn.to_string(),
            title: title.to_string(),
            author: author.to_string(),
            publisher: Some(publisher.to_string()),
            category: Some(category.to_string()),
            total_copies: (idx % 5) as i64 + 1,
            available_copies: None,
        };

        if let Err(e) = db.books().insert(&book).await {
            eprintln!("Failed to insert {}: {}", book.isbn, e);
        }
    }
    println!("✓ Generated {} books", BOOKS.len());

    let mut loans = 0;
    for (n, (isbn, ..)) in BOOKS.iter().enumerate().take(student_count.min(5)) {
        let student_id = format!("STU-{:04}", n + 1);
        match db.transactions().issue(&student_id, isbn, Utc::now()).await {
            Ok(_) => loans += 1,
            Err(e) => eprintln!("Failed to issue {} to {}: {}", isbn, student_id, e),
        }
    }
    println!("✓ Issued {} loans", loans);

    db.persist().await?;

    println!();
    println!("Done in {:.2?}", start.elapsed());
    Ok(())
}
