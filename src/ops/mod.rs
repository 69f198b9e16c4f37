pub mod tag_ops;
