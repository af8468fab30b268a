//! Tenant filter to CAPO filter translation
//!
//! Pure, total functions. Tags are opaque strings: they are copied
//! element-wise in order, never deduplicated or validated. An empty input
//! list always becomes an empty `Vec`.

use crate::capo;
use crate::tenant;

/// The four tag lists of a filter, in CAPO field order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagLists {
    pub tags: Vec<tenant::NeutronTag>,
    pub tags_any: Vec<tenant::NeutronTag>,
    pub not_tags: Vec<tenant::NeutronTag>,
    pub not_tags_any: Vec<tenant::NeutronTag>,
}

fn convert_tags(tags: &[tenant::NeutronTag]) -> Vec<capo::NeutronTag> {
    tags.iter().map(|t| capo::NeutronTag(t.0.clone())).collect()
}

/// Build CAPO tag matching from the tenant's four tag lists
pub fn translate_filter_tags(
    tags: &[tenant::NeutronTag],
    tags_any: &[tenant::NeutronTag],
    not_tags: &[tenant::NeutronTag],
    not_tags_any: &[tenant::NeutronTag],
) -> capo::FilterByNeutronTags {
    capo::FilterByNeutronTags {
        tags: convert_tags(tags),
        tags_any: convert_tags(tags_any),
        not_tags: convert_tags(not_tags),
        not_tags_any: convert_tags(not_tags_any),
    }
}

/// Inverse of [`translate_filter_tags`]
pub fn project_filter_tags(filter: &capo::FilterByNeutronTags) -> TagLists {
    let back = |tags: &[capo::NeutronTag]| -> Vec<tenant::NeutronTag> {
        tags.iter().map(|t| tenant::NeutronTag(t.0.clone())).collect()
    };
    TagLists {
        tags: back(&filter.tags),
        tags_any: back(&filter.tags_any),
        not_tags: back(&filter.not_tags),
        not_tags_any: back(&filter.not_tags_any),
    }
}

impl capo::FilterByNeutronTags {
    /// Owned form of [`project_filter_tags`]
    pub fn into_tag_lists(self) -> TagLists {
        let back = |tags: Vec<capo::NeutronTag>| -> Vec<tenant::NeutronTag> {
            tags.into_iter().map(|t| tenant::NeutronTag(t.0)).collect()
        };
        TagLists {
            tags: back(self.tags),
            tags_any: back(self.tags_any),
            not_tags: back(self.not_tags),
            not_tags_any: back(self.not_tags_any),
        }
    }
}

pub fn subnet_filter(filter: &tenant::SubnetFilter) -> capo::SubnetFilter {
    capo::SubnetFilter {
        name: filter.name.clone(),
        description: filter.description.clone(),
        project_id: filter.project_id.clone(),
        ip_version: filter.ip_version,
        gateway_ip: filter.gateway_ip.clone(),
        cidr: filter.cidr.clone(),
        ipv6_address_mode: filter.ipv6_address_mode.clone(),
        ipv6_ra_mode: filter.ipv6_ra_mode.clone(),
        filter_by_neutron_tags: translate_filter_tags(
            &filter.tags,
            &filter.tags_any,
            &filter.not_tags,
            &filter.not_tags_any,
        ),
    }
}

pub fn router_filter(filter: &tenant::RouterFilter) -> capo::RouterFilter {
    capo::RouterFilter {
        name: filter.name.clone(),
        description: filter.description.clone(),
        project_id: filter.project_id.clone(),
        filter_by_neutron_tags: translate_filter_tags(
            &filter.tags,
            &filter.tags_any,
            &filter.not_tags,
            &filter.not_tags_any,
        ),
    }
}

pub fn network_filter(filter: &tenant::NetworkFilter) -> capo::NetworkFilter {
    capo::NetworkFilter {
        name: filter.name.clone(),
        description: filter.description.clone(),
        project_id: filter.project_id.clone(),
        filter_by_neutron_tags: translate_filter_tags(
            &filter.tags,
            &filter.tags_any,
            &filter.not_tags,
            &filter.not_tags_any,
        ),
    }
}

pub fn subnet_param(param: &tenant::SubnetParam) -> capo::SubnetParam {
    capo::SubnetParam {
        id: param.id.clone(),
        filter: param.filter.as_ref().map(subnet_filter),
    }
}

pub fn router_param(param: &tenant::RouterParam) -> capo::RouterParam {
    capo::RouterParam {
        id: param.id.clone(),
        filter: param.filter.as_ref().map(router_filter),
    }
}

pub fn network_param(param: &tenant::NetworkParam) -> capo::NetworkParam {
    capo::NetworkParam {
        id: param.id.clone(),
        filter: param.filter.as_ref().map(network_filter),
    }
}
