use crate::graph::{amplify::Amplify, node::GraphNode};

pub trait NodeExt: GraphNode + Sized {
    fn amplify<M: GraphNode>(self, envelope: M) -> Amplify<Self, M> {
        Amplify::new(self, envelope)
    }
}

impl<T: GraphNode> NodeExt for T {}
