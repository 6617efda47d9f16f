mod dataset_ordering;
mod report_over_dataset;
