//! EC2 family scanners: instances, EBS volumes, Elastic IPs, VPCs and security groups

use super::service_error;
use crate::aws::context::AwsContext;
use crate::inventory::types::Credentials;
use crate::scanner::error::ScannerResult;
use crate::scanner::fields::{
    format_sdk_time, format_tags, name_from_tags, or_na, value_or_na, yes_no, NOT_AVAILABLE,
};
use crate::scanner::record::ResourceRecord;
use crate::scanner::traits::{Scanner, ScannerDescriptor};
use aws_sdk_ec2::types::Tag;
use std::sync::Arc;

fn tag_pairs(tags: &[Tag]) -> Vec<(&str, &str)> {
    tags.iter()
        .map(|t| (t.key().unwrap_or_default(), t.value().unwrap_or_default()))
        .collect()
}

fn client(context: &AwsContext, credentials: &Credentials, region: &str) -> aws_sdk_ec2::Client {
    aws_sdk_ec2::Client::new(&context.config_for(credentials, region))
}

fn arn(region: &str, account_id: &str, kind: &str, id: &str) -> String {
    format!("arn:aws:ec2:{}:{}:{}/{}", region, account_id, kind, id)
}

pub const INSTANCE: ScannerDescriptor = ScannerDescriptor {
    resource_type: "ec2_instance",
    display_name: "EC2 Instance",
    is_global: false,
    columns: &[
        "Instance Name",
        "Instance ID",
        "Account ID",
        "Account Name",
        "Region",
        "ARN",
        "Instance State",
        "Instance Type",
        "Platform",
        "Private IP",
        "Public IP",
        "VPC ID",
        "Subnet ID",
        "IAM Instance Profile",
        "Launch Time",
        "Tags",
    ],
};

pub struct InstanceScanner {
    context: AwsContext,
}

#[async_trait::async_trait]
impl Scanner for InstanceScanner {
    fn descriptor(&self) -> ScannerDescriptor {
        INSTANCE
    }

    async fn invoke(
        &self,
        credentials: &Credentials,
        account_id: &str,
        account_name: &str,
        region: &str,
    ) -> ScannerResult<Vec<ResourceRecord>> {
        let ec2 = client(&self.context, credentials, region);
        let mut pages = ec2.describe_instances().into_paginator().send();
        let mut records = Vec::new();

        while let Some(page) = pages.next().await {
            let page = page.map_err(service_error)?;
            for instance in page.reservations().iter().flat_map(|r| r.instances()) {
                let Some(instance_id) = instance.instance_id() else {
                    continue;
                };
                let tags = tag_pairs(instance.tags());
                records.push(
                    ResourceRecord::new()
                        .field("Instance Name", name_from_tags(tags.iter().copied()))
                        .field("Instance ID", instance_id)
                        .field("Account ID", account_id)
                        .field("Account Name", account_name)
                        .field("Region", region)
                        .field("ARN", arn(region, account_id, "instance", instance_id))
                        .field(
                            "Instance State",
                            or_na(instance.state().and_then(|s| s.name()).map(|n| n.as_str())),
                        )
                        .field(
                            "Instance Type",
                            or_na(instance.instance_type().map(|t| t.as_str())),
                        )
                        .field(
                            "Platform",
                            instance.platform_details().unwrap_or("Linux/UNIX"),
                        )
                        .field("Private IP", or_na(instance.private_ip_address()))
                        .field("Public IP", or_na(instance.public_ip_address()))
                        .field("VPC ID", or_na(instance.vpc_id()))
                        .field("Subnet ID", or_na(instance.subnet_id()))
                        .field(
                            "IAM Instance Profile",
                            or_na(instance.iam_instance_profile().and_then(|p| p.arn())),
                        )
                        .field("Launch Time", format_sdk_time(instance.launch_time()))
                        .field("Tags", format_tags(tags.iter().copied())),
                );
            }
        }

        Ok(records)
    }
}

pub const VOLUME: ScannerDescriptor = ScannerDescriptor {
    resource_type: "ebs_volume",
    display_name: "EBS Volume",
    is_global: false,
    columns: &[
        "Volume Name",
        "Volume ID",
        "Account ID",
        "Account Name",
        "Region",
        "ARN",
        "State",
        "Volume Type",
        "Size (GiB)",
        "IOPS",
        "Throughput",
        "Encrypted",
        "Attached Instance",
        "Availability Zone",
        "Created Time",
        "Tags",
    ],
};

pub struct VolumeScanner {
    context: AwsContext,
}

#[async_trait::async_trait]
impl Scanner for VolumeScanner {
    fn descriptor(&self) -> ScannerDescriptor {
        VOLUME
    }

    async fn invoke(
        &self,
        credentials: &Credentials,
        account_id: &str,
        account_name: &str,
        region: &str,
    ) -> ScannerResult<Vec<ResourceRecord>> {
        let ec2 = client(&self.context, credentials, region);
        let mut pages = ec2.describe_volumes().into_paginator().send();
        let mut records = Vec::new();

        while let Some(page) = pages.next().await {
            let page = page.map_err(service_error)?;
            for volume in page.volumes() {
                let Some(volume_id) = volume.volume_id() else {
                    continue;
                };
                let tags = tag_pairs(volume.tags());
                let attached: Vec<&str> = volume
                    .attachments()
                    .iter()
                    .filter_map(|a| a.instance_id())
                    .collect();
                let attached = if attached.is_empty() {
                    "Not Attached".to_string()
                } else {
                    attached.join(", ")
                };
                records.push(
                    ResourceRecord::new()
                        .field("Volume Name", name_from_tags(tags.iter().copied()))
                        .field("Volume ID", volume_id)
                        .field("Account ID", account_id)
                        .field("Account Name", account_name)
                        .field("Region", region)
                        .field("ARN", arn(region, account_id, "volume", volume_id))
                        .field("State", or_na(volume.state().map(|s| s.as_str())))
                        .field(
                            "Volume Type",
                            or_na(volume.volume_type().map(|t| t.as_str())),
                        )
                        .field("Size (GiB)", value_or_na(volume.size()))
                        .field("IOPS", value_or_na(volume.iops()))
                        .field("Throughput", value_or_na(volume.throughput()))
                        .field("Encrypted", yes_no(volume.encrypted()))
                        .field("Attached Instance", attached)
                        .field("Availability Zone", or_na(volume.availability_zone()))
                        .field("Created Time", format_sdk_time(volume.create_time()))
                        .field("Tags", format_tags(tags.iter().copied())),
                );
            }
        }

        Ok(records)
    }
}

pub const ELASTIC_IP: ScannerDescriptor = ScannerDescriptor {
    resource_type: "elastic_ip",
    display_name: "Elastic IP",
    is_global: false,
    columns: &[
        "EIP Name",
        "Allocation ID",
        "Account ID",
        "Account Name",
        "Region",
        "ARN",
        "Public IP",
        "Private IP",
        "Domain",
        "Associated Instance",
        "Associated ENI",
        "Tags",
    ],
};

pub struct ElasticIpScanner {
    context: AwsContext,
}

#[async_trait::async_trait]
impl Scanner for ElasticIpScanner {
    fn descriptor(&self) -> ScannerDescriptor {
        ELASTIC_IP
    }

    async fn invoke(
        &self,
        credentials: &Credentials,
        account_id: &str,
        account_name: &str,
        region: &str,
    ) -> ScannerResult<Vec<ResourceRecord>> {
        let ec2 = client(&self.context, credentials, region);
        // DescribeAddresses is not paginated
        let output = ec2
            .describe_addresses()
            .send()
            .await
            .map_err(service_error)?;

        let records = output
            .addresses()
            .iter()
            .map(|address| {
                let tags = tag_pairs(address.tags());
                let address_arn = address
                    .allocation_id()
                    .map(|id| arn(region, account_id, "elastic-ip", id))
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string());
                ResourceRecord::new()
                    .field("EIP Name", name_from_tags(tags.iter().copied()))
                    .field("Allocation ID", or_na(address.allocation_id()))
                    .field("Account ID", account_id)
                    .field("Account Name", account_name)
                    .field("Region", region)
                    .field("ARN", address_arn)
                    .field("Public IP", or_na(address.public_ip()))
                    .field("Private IP", or_na(address.private_ip_address()))
                    .field("Domain", or_na(address.domain().map(|d| d.as_str())))
                    .field(
                        "Associated Instance",
                        address.instance_id().unwrap_or("Not Associated"),
                    )
                    .field("Associated ENI", or_na(address.network_interface_id()))
                    .field("Tags", format_tags(tags.iter().copied()))
            })
            .collect();

        Ok(records)
    }
}

pub const VPC: ScannerDescriptor = ScannerDescriptor {
    resource_type: "vpc",
    display_name: "VPC",
    is_global: false,
    columns: &[
        "VPC Name",
        "VPC ID",
        "Account ID",
        "Account Name",
        "Region",
        "ARN",
        "State",
        "CIDR Block",
        "Is Default",
        "DHCP Options ID",
        "Instance Tenancy",
        "Tags",
    ],
};

pub struct VpcScanner {
    context: AwsContext,
}

#[async_trait::async_trait]
impl Scanner for VpcScanner {
    fn descriptor(&self) -> ScannerDescriptor {
        VPC
    }

    async fn invoke(
        &self,
        credentials: &Credentials,
        account_id: &str,
        account_name: &str,
        region: &str,
    ) -> ScannerResult<Vec<ResourceRecord>> {
        let ec2 = client(&self.context, credentials, region);
        let mut pages = ec2.describe_vpcs().into_paginator().send();
        let mut records = Vec::new();

        while let Some(page) = pages.next().await {
            let page = page.map_err(service_error)?;
            for vpc in page.vpcs() {
                let Some(vpc_id) = vpc.vpc_id() else {
                    continue;
                };
                let tags = tag_pairs(vpc.tags());
                let mut cidr_blocks = vec![or_na(vpc.cidr_block())];
                for block in vpc
                    .cidr_block_association_set()
                    .iter()
                    .filter_map(|a| a.cidr_block())
                {
                    if !cidr_blocks.iter().any(|b| b == block) {
                        cidr_blocks.push(block.to_string());
                    }
                }
                records.push(
                    ResourceRecord::new()
                        .field("VPC Name", name_from_tags(tags.iter().copied()))
                        .field("VPC ID", vpc_id)
                        .field("Account ID", account_id)
                        .field("Account Name", account_name)
                        .field("Region", region)
                        .field("ARN", arn(region, account_id, "vpc", vpc_id))
                        .field("State", or_na(vpc.state().map(|s| s.as_str())))
                        .field("CIDR Block", cidr_blocks.join(", "))
                        .field("Is Default", yes_no(vpc.is_default()))
                        .field("DHCP Options ID", or_na(vpc.dhcp_options_id()))
                        .field(
                            "Instance Tenancy",
                            or_na(vpc.instance_tenancy().map(|t| t.as_str())),
                        )
                        .field("Tags", format_tags(tags.iter().copied())),
                );
            }
        }

        Ok(records)
    }
}

pub const SECURITY_GROUP: ScannerDescriptor = ScannerDescriptor {
    resource_type: "security_group",
    display_name: "Security Group",
    is_global: false,
    columns: &[
        "Security Group Name",
        "Security Group ID",
        "Account ID",
        "Account Name",
        "Region",
        "ARN",
        "VPC ID",
        "Description",
        "Inbound Rules Count",
        "Outbound Rules Count",
        "Tags",
    ],
};

pub struct SecurityGroupScanner {
    context: AwsContext,
}

#[async_trait::async_trait]
impl Scanner for SecurityGroupScanner {
    fn descriptor(&self) -> ScannerDescriptor {
        SECURITY_GROUP
    }

    async fn invoke(
        &self,
        credentials: &Credentials,
        account_id: &str,
        account_name: &str,
        region: &str,
    ) -> ScannerResult<Vec<ResourceRecord>> {
        let ec2 = client(&self.context, credentials, region);
        let mut pages = ec2.describe_security_groups().into_paginator().send();
        let mut records = Vec::new();

        while let Some(page) = pages.next().await {
            let page = page.map_err(service_error)?;
            for group in page.security_groups() {
                let Some(group_id) = group.group_id() else {
                    continue;
                };
                let tags = tag_pairs(group.tags());
                records.push(
                    ResourceRecord::new()
                        .field("Security Group Name", or_na(group.group_name()))
                        .field("Security Group ID", group_id)
                        .field("Account ID", account_id)
                        .field("Account Name", account_name)
                        .field("Region", region)
                        .field("ARN", arn(region, account_id, "security-group", group_id))
                        .field("VPC ID", or_na(group.vpc_id()))
                        .field("Description", or_na(group.description()))
                        .field("Inbound Rules Count", group.ip_permissions().len())
                        .field("Outbound Rules Count", group.ip_permissions_egress().len())
                        .field("Tags", format_tags(tags.iter().copied())),
                );
            }
        }

        Ok(records)
    }
}

fn build_instances(context: &AwsContext) -> Arc<dyn Scanner> {
    Arc::new(InstanceScanner {
        context: context.clone(),
    })
}

fn build_volumes(context: &AwsContext) -> Arc<dyn Scanner> {
    Arc::new(VolumeScanner {
        context: context.clone(),
    })
}

fn build_elastic_ips(context: &AwsContext) -> Arc<dyn Scanner> {
    Arc::new(ElasticIpScanner {
        context: context.clone(),
    })
}

fn build_vpcs(context: &AwsContext) -> Arc<dyn Scanner> {
    Arc::new(VpcScanner {
        context: context.clone(),
    })
}

fn build_security_groups(context: &AwsContext) -> Arc<dyn Scanner> {
    Arc::new(SecurityGroupScanner {
        context: context.clone(),
    })
}

crate::builtin_scanner!(build_instances);
crate::builtin_scanner!(build_volumes);
crate::builtin_scanner!(build_elastic_ips);
crate::builtin_scanner!(build_vpcs);
crate::builtin_scanner!(build_security_groups);
