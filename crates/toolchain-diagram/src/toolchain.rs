//! The DevOps toolchain topology
//!
//! Terraform provisions a Docker-hosted K3D cluster and its registry, Helm
//! installs the in-cluster services (ArgoCD with Image Updater, GitLab,
//! Rancher, LocalStack).

use anyhow::Result;
use tracing::{debug, info};

use crate::assets::{AssetPaths, IconAsset};
use crate::core::{
    attributes, BuiltinIcon, Diagram, Direction, EdgeAttrs, EdgeStyle, NodeIcon, OutputFormat,
    Scope,
};

pub const TITLE: &str = "DevOps Tools on K3D Cluster with Terraform";

/// Output file name, without extension
pub const FILENAME: &str = "terraform_k3d_diagram";

pub const K3D_ICON: &str = "k3d";
pub const RANCHER_ICON: &str = "rancher";
pub const LOCALSTACK_ICON: &str = "localstack";

/// Custom icons downloaded before the diagram is built
pub const ICONS: [IconAsset; 3] = [
    IconAsset::new(
        K3D_ICON,
        "https://k3d.io/stable/static/img/k3d_logo_black_blue.svg",
        "k3d.svg",
    ),
    IconAsset::new(
        RANCHER_ICON,
        "https://rancher.com/docs/img/logo-square.png",
        "rancher.png",
    ),
    IconAsset::new(
        LOCALSTACK_ICON,
        "https://avatars.githubusercontent.com/u/28732122?s=280&v=4",
        "localstack.png",
    ),
];

const PROVISION_COLOR: &str = "#5C4EE5";
const CLUSTER_LINK_COLOR: &str = "#0066CC";
const INSTALL_COLOR: &str = "#004D99";

fn custom(assets: &AssetPaths, key: &str) -> Result<NodeIcon> {
    Ok(NodeIcon::Custom(assets.path(key)?.to_path_buf()))
}

/// Build the toolchain diagram from the fetched icon paths
///
/// Fails with a topology error if an icon key is missing from `assets`.
pub fn build(assets: &AssetPaths) -> Result<Diagram> {
    let k3d_icon = custom(assets, K3D_ICON)?;
    let rancher_icon = custom(assets, RANCHER_ICON)?;
    let localstack_icon = custom(assets, LOCALSTACK_ICON)?;

    let mut diagram = Diagram::new(TITLE)
        .with_filename(FILENAME)
        .with_format(OutputFormat::Png)
        .with_direction(Direction::LeftRight)
        .with_graph_attrs(attributes([
            ("fontsize", "16"),
            ("bgcolor", "white"),
            ("pad", "0.8"),
            ("splines", "spline"),
            ("nodesep", "1.0"),
            ("ranksep", "1.5"),
        ]));

    let terraform = diagram.node("Terraform\nRoot Module", BuiltinIcon::Terraform);

    let (docker, k3d) = diagram.cluster(
        "Infrastructure Layer",
        attributes([
            ("bgcolor", "#E8F4F8"),
            ("pencolor", "#0066CC"),
            ("penwidth", "2"),
            ("style", "rounded"),
        ]),
        |infra| {
            let docker = infra.node("Docker Engine", BuiltinIcon::Docker);
            let k3d = infra.node("K3D Cluster\n(1 server + 3 agents)", k3d_icon.clone());
            let registry = infra.node("K3D Registry\n(port 5000)", k3d_icon);
            infra.chain(&[docker, k3d, registry], EdgeAttrs::new())?;
            Ok((docker, k3d))
        },
    )?;

    let helm = diagram.node("Helm\nPackage Manager", BuiltinIcon::Helm);

    let services = diagram.cluster(
        "K8s Services",
        attributes([
            ("bgcolor", "#FAFAFA"),
            ("pencolor", "#666666"),
            ("penwidth", "2"),
            ("style", "rounded"),
        ]),
        |services| {
            let (argocd, gitlab) = services.cluster(
                "GitOps & CI/CD",
                attributes([
                    ("bgcolor", "#FFF4E6"),
                    ("pencolor", "#FF6B35"),
                    ("style", "rounded"),
                ]),
                |gitops| {
                    let argocd = gitops.node("ArgoCD\n:9080", BuiltinIcon::ArgoCd);
                    let updater = gitops.node("Image Updater", BuiltinIcon::ArgoCd);
                    let gitlab = gitops.node("GitLab\n:8090/:2222", BuiltinIcon::GitLab);
                    gitops.edge(argocd, updater, EdgeAttrs::new())?;
                    Ok((argocd, gitlab))
                },
            )?;

            let (rancher, localstack) = services.cluster(
                "Management",
                attributes([
                    ("bgcolor", "#F0F8F0"),
                    ("pencolor", "#28A745"),
                    ("style", "rounded"),
                ]),
                |management| {
                    let rancher = management.node("Rancher\n:7080/:7443", rancher_icon);
                    let localstack = management.node("LocalStack\n:4566", localstack_icon);
                    Ok((rancher, localstack))
                },
            )?;

            Ok([argocd, gitlab, rancher, localstack])
        },
    )?;

    let provision = EdgeAttrs::new()
        .color(PROVISION_COLOR)
        .style(EdgeStyle::Bold);
    diagram.edge(terraform, docker, provision.clone())?;
    diagram.edge(terraform, helm, provision)?;
    diagram.edge(
        k3d,
        helm,
        EdgeAttrs::new()
            .color(CLUSTER_LINK_COLOR)
            .style(EdgeStyle::Dashed),
    )?;
    diagram.fan_out(
        helm,
        &services,
        EdgeAttrs::new().color(INSTALL_COLOR).style(EdgeStyle::Bold),
    )?;

    diagram.validate()?;
    debug!(
        nodes = diagram.node_count(),
        clusters = diagram.cluster_count(),
        edges = diagram.edge_count(),
        "Toolchain topology declared"
    );
    info!(title = TITLE, "Topology built");
    Ok(diagram)
}
