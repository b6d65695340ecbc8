//! Per-call encode and decode state.
//!
//! A parameter may be referenced from many places in one tree. On encode,
//! each distinct parameter gets one freshly minted [`Uuid`] that every
//! reference carries; on decode, the first sighting of an id creates the
//! parameter and every later sighting reuses it. States are created fresh
//! for each top-level call and are never shared.

use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;
use treewire_core::{CoreError, ExprGraph, ParamId, TypeRef, TypeRegistry};

use crate::error::CodecError;
use crate::policy::{DecodeOptions, EncodeOptions};
use crate::signature::SignatureCodec;

/// What a parameter node carries on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterPayload {
    pub id: Uuid,
    /// Type descriptor.
    pub ty: String,
    pub name: String,
}

/// Nesting counter checked against an optional limit.
#[derive(Debug, Clone, Copy)]
struct Depth {
    current: usize,
    limit: Option<usize>,
}

impl Depth {
    fn new(limit: Option<usize>) -> Self {
        Depth { current: 0, limit }
    }

    fn enter(&mut self) -> Result<(), CodecError> {
        self.current += 1;
        match self.limit {
            Some(limit) if self.current > limit => {
                self.current -= 1;
                Err(CodecError::DepthLimitExceeded { limit })
            }
            _ => Ok(()),
        }
    }

    fn leave(&mut self) {
        self.current = self.current.saturating_sub(1);
    }
}

pub struct EncodeState<'a> {
    codec: &'a SignatureCodec<'a>,
    graph: &'a ExprGraph,
    parameters: HashMap<ParamId, ParameterPayload>,
    depth: Depth,
}

impl<'a> EncodeState<'a> {
    pub fn new(codec: &'a SignatureCodec<'a>, graph: &'a ExprGraph, options: &EncodeOptions) -> Self {
        EncodeState {
            codec,
            graph,
            parameters: HashMap::new(),
            depth: Depth::new(options.max_depth),
        }
    }

    pub fn codec(&self) -> &'a SignatureCodec<'a> {
        self.codec
    }

    pub fn types(&self) -> &'a TypeRegistry {
        self.codec.types()
    }

    pub fn graph(&self) -> &'a ExprGraph {
        self.graph
    }

    /// The wire payload for parameter `id`, minting its uuid on first use.
    pub fn intern_parameter(&mut self, id: ParamId) -> Result<ParameterPayload, CodecError> {
        if let Some(payload) = self.parameters.get(&id) {
            return Ok(payload.clone());
        }
        let def = self
            .graph
            .param(id)
            .ok_or(CoreError::ParameterNotFound { id })?;
        let payload = ParameterPayload {
            id: Uuid::new_v4(),
            ty: self.codec.encode_type(&def.ty)?,
            name: def.name.clone(),
        };
        debug!(param = %id, uuid = %payload.id, name = %payload.name, "minted parameter id");
        self.parameters.insert(id, payload.clone());
        Ok(payload)
    }

    pub fn enter(&mut self) -> Result<(), CodecError> {
        self.depth.enter()
    }

    pub fn leave(&mut self) {
        self.depth.leave()
    }
}

pub struct DecodeState<'a> {
    codec: &'a SignatureCodec<'a>,
    options: &'a DecodeOptions,
    graph: ExprGraph,
    parameters: HashMap<Uuid, ParamId>,
    depth: Depth,
}

impl<'a> DecodeState<'a> {
    pub fn new(codec: &'a SignatureCodec<'a>, options: &'a DecodeOptions) -> Self {
        DecodeState {
            codec,
            options,
            graph: ExprGraph::new(),
            parameters: HashMap::new(),
            depth: Depth::new(options.max_depth),
        }
    }

    pub fn codec(&self) -> &'a SignatureCodec<'a> {
        self.codec
    }

    pub fn types(&self) -> &'a TypeRegistry {
        self.codec.types()
    }

    pub fn options(&self) -> &'a DecodeOptions {
        self.options
    }

    /// The arena being rebuilt.
    pub fn graph(&self) -> &ExprGraph {
        &self.graph
    }

    pub fn into_graph(self) -> ExprGraph {
        self.graph
    }

    /// The parameter for wire id `id`, created on first sighting.
    ///
    /// Later sightings return the same parameter whatever `ty` and `name` say.
    pub fn resolve_parameter(&mut self, id: Uuid, ty: TypeRef, name: &str) -> ParamId {
        if let Some(param) = self.parameters.get(&id) {
            return *param;
        }
        let param = self.graph.parameter(ty, name);
        debug!(uuid = %id, param = %param, name, "created parameter");
        self.parameters.insert(id, param);
        param
    }

    pub fn enter(&mut self) -> Result<(), CodecError> {
        self.depth.enter()
    }

    pub fn leave(&mut self) {
        self.depth.leave()
    }
}
