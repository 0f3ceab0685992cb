//! Graph validation logic.

use crate::error::{GraphError, GraphResult};
use crate::graph::{BlockGraph, Port, PortDirection, PortRef};

/// Check that `src -> dst` is a legal link.
///
/// Order of checks: self-link, direction, disabled, type, occupancy.
pub(crate) fn check_link(src: PortRef, src_port: &Port, dst: PortRef, dst_port: &Port) -> GraphResult<()> {
    if src.block == dst.block {
        return Err(GraphError::SelfLinkError { block: src.block });
    }

    if src_port.direction != PortDirection::Out || dst_port.direction == PortDirection::Out {
        return Err(GraphError::LinkDirectionError {
            src,
            src_dir: src_port.direction,
            dst,
            dst_dir: dst_port.direction,
        });
    }

    for (r, p) in [(src, src_port), (dst, dst_port)] {
        if p.signal_type.is_disabled() {
            return Err(GraphError::DisabledPort(r));
        }
    }

    if src_port.signal_type != dst_port.signal_type {
        return Err(GraphError::LinkTypeMismatch {
            src,
            src_type: src_port.signal_type,
            dst,
            dst_type: dst_port.signal_type,
        });
    }

    for (r, p) in [(src, src_port), (dst, dst_port)] {
        if let Some(link) = p.link {
            return Err(GraphError::PortAlreadyLinked { port: r, link });
        }
    }

    Ok(())
}

/// Validate every link against its endpoints and the endpoints' bookkeeping.
pub(crate) fn validate_graph(graph: &BlockGraph) -> GraphResult<()> {
    for link in graph.links() {
        let src = graph
            .port(link.source)
            .ok_or(GraphError::UnknownPort(link.source))?;
        let dst = graph
            .port(link.dest)
            .ok_or(GraphError::UnknownPort(link.dest))?;

        // Re-run the structural checks with occupancy masked out.
        let unlinked = |p: &Port| Port {
            link: None,
            ..p.clone()
        };
        check_link(link.source, &unlinked(src), link.dest, &unlinked(dst))?;

        if src.link != Some(link.id) || dst.link != Some(link.id) {
            return Err(GraphError::Inconsistent {
                link: link.id,
                what: "endpoint does not reference link",
            });
        }
        if !src.connected || !dst.connected {
            return Err(GraphError::Inconsistent {
                link: link.id,
                what: "endpoint not marked connected",
            });
        }
        if link.signal_type != src.signal_type {
            return Err(GraphError::Inconsistent {
                link: link.id,
                what: "link signal type differs from endpoints",
            });
        }
    }

    for block in graph.blocks() {
        for port in &block.ports {
            let here = PortRef::new(block.id, port.id);
            if let Some(id) = port.link {
                let link = graph.link(id).ok_or(GraphError::UnknownLink(id))?;
                if link.source != here && link.dest != here {
                    return Err(GraphError::Inconsistent {
                        link: id,
                        what: "port references a link it is not an endpoint of",
                    });
                }
            }
        }
    }

    Ok(())
}
