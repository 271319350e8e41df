pub mod lookup_tree;
