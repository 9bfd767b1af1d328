mod visitor;

pub(crate) use visitor::FilterVisitor;
