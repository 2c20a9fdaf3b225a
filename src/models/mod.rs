pub mod course_table;

pub use course_table::{CourseTable, NewTableRequest};
