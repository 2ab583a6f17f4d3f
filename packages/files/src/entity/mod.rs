pub mod review_round_file;
pub mod submission_file;
