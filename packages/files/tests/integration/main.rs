
mod review_rounds;
