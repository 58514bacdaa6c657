mod labels;
mod segments;
