use flowcore::{NodeSpec, Workflow, WorkflowError};
use std::collections::{HashMap, VecDeque};

/// Compute the execution order of a workflow's nodes.
///
/// Kahn's algorithm over index arrays. The queue is seeded with every node
/// that has no incoming edge, in declaration order, and successors are
/// visited in edge declaration order, so the result is deterministic for a
/// given graph. A cycle yields an error and no partial order.
pub fn plan(workflow: &Workflow) -> Result<Vec<&NodeSpec>, WorkflowError> {
    let nodes = workflow.nodes();

    let mut index_of: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
    for (idx, node) in nodes.iter().enumerate() {
        if index_of.insert(node.id.as_str(), idx).is_some() {
            return Err(WorkflowError::Invalid(format!(
                "duplicate node id {} in workflow {}",
                node.id, workflow.id
            )));
        }
    }

    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut in_degree: Vec<usize> = vec![0; nodes.len()];

    for edge in workflow.edges() {
        let from = *index_of
            .get(edge.source.as_str())
            .ok_or_else(|| WorkflowError::NodeNotFound(edge.source.clone()))?;
        let to = *index_of
            .get(edge.target.as_str())
            .ok_or_else(|| WorkflowError::NodeNotFound(edge.target.clone()))?;

        successors[from].push(to);
        in_degree[to] += 1;
    }

    let mut queue: VecDeque<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(idx) = queue.pop_front() {
        order.push(&nodes[idx]);
        for &next in &successors[idx] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                queue.push_back(next);
            }
        }
    }

    if order.len() < nodes.len() {
        return Err(WorkflowError::CyclicDependency {
            workflow: workflow.id.clone(),
        });
    }

    Ok(order)
}
